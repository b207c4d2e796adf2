//! Merge decisions and the metadata block attached to merged records.
//!
//! Decisions are explicit objects, not hidden log lines. When field values
//! conflict inside a group, the executor records a `MergeDecision` that
//! names the field, the strategy, every value considered, and the result.
//! The metadata block is assembled once, after validation, and never
//! mutated afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assess::{ComplexityLevel, RiskLevel};
use crate::classify::FieldKind;
use crate::strategy::StrategyName;
use crate::value::FieldValue;

/// Unique identifier for a merge decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(Uuid);

impl DecisionId {
    /// Creates a new random decision ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded resolution of a field-level conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeDecision {
    /// Unique identifier for this decision.
    pub id: DecisionId,

    /// The field the conflict occurred on.
    pub field: String,

    /// The field's classified kind.
    pub kind: FieldKind,

    /// The strategy that resolved the conflict.
    pub strategy: StrategyName,

    /// Confidence in the result, 0.0 to 1.0.
    pub confidence: f32,

    /// Distinct values that were considered, in first-seen order.
    pub values_considered: Vec<FieldValue>,

    /// The resolved value.
    pub result: FieldValue,

    /// Notes, e.g. values excluded as unparseable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl MergeDecision {
    /// Returns true if the result confidence falls below `threshold`.
    #[must_use]
    pub fn is_low_confidence(&self, threshold: f32) -> bool {
        self.confidence < threshold
    }
}

impl fmt::Display for MergeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} via {} ({:.2}) from {} values",
            self.field,
            self.result,
            self.strategy,
            self.confidence,
            self.values_considered.len()
        )
    }
}

/// Integrity verdict attached to each merged group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    /// All integrity checks passed.
    Verified,
    /// An integrity check failed; the run is aborted.
    Violated,
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Violated => write!(f, "violated"),
        }
    }
}

/// Validation outcome recorded in the metadata block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Integrity verdict for the group.
    pub integrity: IntegrityStatus,

    /// Risk level assessed for the group.
    pub risk: RiskLevel,

    /// Warnings raised during assessment, e.g. identifier conflicts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// The metadata block stored under the reserved `_merge_metadata` field.
///
/// Assembled once per group after assessment and integrity checking;
/// treated as immutable from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeMetadata {
    /// Whether the group actually merged multiple records.
    pub was_merged: bool,

    /// When the merge happened.
    pub merged_at: DateTime<Utc>,

    /// How many source records the group held.
    pub original_record_count: usize,

    /// Complexity level derived from the decision count.
    pub complexity: ComplexityLevel,

    /// Fields whose values differed across the group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub differing_fields: Vec<String>,

    /// Every conflict resolution recorded for the group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<MergeDecision>,

    /// Validation outcome.
    pub validation: ValidationSummary,
}

impl MergeMetadata {
    /// Returns the number of recorded decisions.
    #[must_use]
    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }

    /// Returns true if any decision resolved an identifier conflict.
    #[must_use]
    pub fn has_identifier_conflict(&self) -> bool {
        self.decisions
            .iter()
            .any(|d| d.kind == FieldKind::Identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_decision(field: &str, kind: FieldKind, confidence: f32) -> MergeDecision {
        MergeDecision {
            id: DecisionId::new(),
            field: field.to_string(),
            kind,
            strategy: StrategyName::FirstNonNull,
            confidence,
            values_considered: vec![FieldValue::from("a"), FieldValue::from("b")],
            result: FieldValue::from("a"),
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(DecisionId::new(), DecisionId::new());
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_decision_low_confidence() {
        let decision = sample_decision("Notes", FieldKind::Other, 0.5);
        assert!(decision.is_low_confidence(0.6));
        assert!(!decision.is_low_confidence(0.4));
    }

    #[test]
    fn test_decision_display_names_field_and_strategy() {
        let decision = sample_decision("Notes", FieldKind::Other, 0.5);
        let rendered = format!("{decision}");
        assert!(rendered.contains("Notes"));
        assert!(rendered.contains("first_non_null"));
    }

    #[test]
    fn test_metadata_identifier_conflict_detection() {
        let metadata = MergeMetadata {
            was_merged: true,
            merged_at: Utc::now(),
            original_record_count: 2,
            complexity: ComplexityLevel::Low,
            differing_fields: vec!["Asset ID".to_string()],
            decisions: vec![sample_decision("Asset ID", FieldKind::Identifier, 1.0)],
            validation: ValidationSummary {
                integrity: IntegrityStatus::Verified,
                risk: RiskLevel::High,
                warnings: vec!["identifier conflict on 'Asset ID'".to_string()],
            },
        };
        assert!(metadata.has_identifier_conflict());
        assert_eq!(metadata.decision_count(), 1);
    }

    #[test]
    fn test_metadata_serde_round_trip() {
        let metadata = MergeMetadata {
            was_merged: true,
            merged_at: Utc::now(),
            original_record_count: 3,
            complexity: ComplexityLevel::Medium,
            differing_fields: vec!["Status".to_string()],
            decisions: vec![sample_decision("Status", FieldKind::Status, 0.75)],
            validation: ValidationSummary {
                integrity: IntegrityStatus::Verified,
                risk: RiskLevel::Low,
                warnings: Vec::new(),
            },
        };
        let json = serde_json::to_string(&metadata).unwrap();
        let back: MergeMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_empty_collections_skipped_in_json() {
        let metadata = MergeMetadata {
            was_merged: false,
            merged_at: Utc::now(),
            original_record_count: 1,
            complexity: ComplexityLevel::Low,
            differing_fields: Vec::new(),
            decisions: Vec::new(),
            validation: ValidationSummary {
                integrity: IntegrityStatus::Verified,
                risk: RiskLevel::Low,
                warnings: Vec::new(),
            },
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(!json.contains("decisions"));
        assert!(!json.contains("differing_fields"));
    }

    #[test]
    fn test_integrity_status_display() {
        assert_eq!(format!("{}", IntegrityStatus::Verified), "verified");
        assert_eq!(format!("{}", IntegrityStatus::Violated), "violated");
    }
}
