//! # dedup-engine - Record merge and deduplication with an audit trail
//!
//! `dedup-engine` collapses duplicate records in semi-structured datasets
//! into single consolidated records. Merging is per-field: a classifier
//! maps each field name to a semantic kind, a registry maps the kind to a
//! merge strategy, and every conflict resolution is recorded as an
//! explicit decision. A validator proves the output is complete and
//! traceable before the engine returns it.
//!
//! ## Core Concepts
//!
//! - **Record**: An order-preserving map from field name to value; absence,
//!   null, and the empty string are three distinct states
//! - **DuplicateGroup**: Records sharing one key value, in input order
//! - **MergeDecision**: One recorded resolution of a field-level conflict
//! - **MergeReport**: Per-group audits, run totals, and an output digest
//!
//! ## Usage
//!
//! ```rust
//! use dedup_engine::{MergeConfig, MergeEngine, Record};
//!
//! let config = MergeConfig::builder("Action Request Number").build()?;
//! let engine = MergeEngine::new(config);
//!
//! let records = vec![
//!     Record::from(vec![("Action Request Number", "2023-001"), ("Workflow Stage", "Open")]),
//!     Record::from(vec![("Action Request Number", "2023-001"), ("Workflow Stage", "Closed")]),
//! ];
//!
//! let outcome = engine.run(records)?;
//! assert_eq!(outcome.records.len(), 1);
//! println!("{}", outcome.report.summary());
//! # Ok::<(), dedup_engine::MergeError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core data types
pub mod classify;
pub mod error;
pub mod record;
pub mod value;

// Pipeline stages
pub mod assess;
pub mod config;
pub mod decision;
pub mod engine;
pub mod executor;
pub mod group;
pub mod report;
pub mod strategy;
pub mod validate;

// Re-export primary types at crate root for convenience
pub use assess::{
    assess, Assessment, ComplexityLevel, ComplexityThresholds, RiskLevel,
    LOW_CONFIDENCE_THRESHOLD,
};
pub use classify::{ClassifierRule, ClassifierRules, FieldKind};
pub use config::{MergeConfig, MergeConfigBuilder};
pub use decision::{
    DecisionId, IntegrityStatus, MergeDecision, MergeMetadata, RunId, ValidationSummary,
};
pub use engine::{MergeEngine, MergeOutcome};
pub use error::{ConfigError, IntegrityError, MergeError, MergeResult, StructuralError};
pub use executor::{merge_group, MergedDraft};
pub use group::{group, DuplicateGroup};
pub use record::{Record, MERGE_METADATA_FIELD, WAS_MERGED_FIELD};
pub use report::{output_digest, GroupAudit, MergeReport};
pub use strategy::{StrategyContext, StrategyName, StrategyRegistry, StrategyResult};
pub use validate::{check_group_integrity, post_merge_check, pre_merge_check};
pub use value::FieldValue;
