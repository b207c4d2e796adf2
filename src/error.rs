//! Error types for the merge engine.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and provides clear error
//! messages. Fatal conditions (structural defects before merging,
//! integrity violations after) abort the batch: the engine never
//! returns a partially merged result.

use thiserror::Error;

/// Structural errors detected before any merging happens.
///
/// These are fatal: the input cannot be merged as configured.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("Input record set is empty")]
    EmptyInput,

    #[error("Key field '{key_field}' does not exist in any input record")]
    KeyFieldUnknown { key_field: String },

    #[error("Record {record_index} already uses reserved field '{field}'")]
    ReservedField { record_index: usize, field: String },
}

/// Configuration errors raised while building a [`crate::MergeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Key field cannot be empty")]
    EmptyKeyField,

    #[error(
        "Complexity thresholds must be strictly increasing (low_max {low_max}, medium_max {medium_max})"
    )]
    InvalidThresholds { low_max: usize, medium_max: usize },

    #[error("Invalid classifier regex '{pattern}': {reason}")]
    InvalidClassifierRegex { pattern: String, reason: String },

    #[error("Classifier rule for {kind} has no keywords")]
    EmptyKeywordSet { kind: String },

    #[error("Status ranking entries cannot be empty strings")]
    EmptyStatusEntry,
}

/// Integrity violations detected by the post-merge validator.
///
/// Fatal for the run: the batch output must not be treated as valid.
/// Each variant names the specific invariant broken and, where one
/// exists, the offending group's key value.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error(
        "Record count mismatch: expected {expected} merged records, produced {actual}"
    )]
    CountMismatch { expected: usize, actual: usize },

    #[error(
        "Group '{group_key}': value of field '{field}' is neither an unchanged copy nor listed in a merge decision"
    )]
    UntraceableValue { group_key: String, field: String },

    #[error(
        "Group '{group_key}': marked as merged but has an empty decision log and non-identical source records"
    )]
    EmptyDecisionLog { group_key: String },

    #[error("Group '{group_key}': merged output is missing field '{field}'")]
    DroppedField { group_key: String, field: String },
}

/// Top-level error type for the merge engine.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Integrity violation: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MergeError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a structural error.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an integrity violation.
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
