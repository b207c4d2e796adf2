//! Complexity and risk assessment for merged groups.
//!
//! Both scales are three-level and derived from the decision log alone:
//! complexity from the decision count, risk from what the decisions
//! resolved. Identifier conflicts dominate the risk verdict because they
//! mean the grouping key itself disagreed with another identity field.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classify::FieldKind;
use crate::decision::MergeDecision;
use crate::error::ConfigError;

/// Decisions below this confidence pull risk up to at least medium.
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// How involved a group merge was, from the decision count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    /// At most `low_max` decisions.
    Low,
    /// Between `low_max + 1` and `medium_max` decisions.
    Medium,
    /// More than `medium_max` decisions.
    High,
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// How much a merged group deserves human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Routine merge.
    Low,
    /// At least one low-confidence decision.
    Medium,
    /// An identifier field conflicted.
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Decision-count boundaries between complexity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityThresholds {
    /// Highest decision count still rated low.
    pub low_max: usize,
    /// Highest decision count still rated medium.
    pub medium_max: usize,
}

impl ComplexityThresholds {
    /// Creates validated thresholds.
    ///
    /// `low_max` must be strictly below `medium_max`.
    pub fn new(low_max: usize, medium_max: usize) -> Result<Self, ConfigError> {
        if low_max >= medium_max {
            return Err(ConfigError::InvalidThresholds { low_max, medium_max });
        }
        Ok(Self { low_max, medium_max })
    }

    /// Rates a decision count.
    #[must_use]
    pub const fn level_for(&self, decision_count: usize) -> ComplexityLevel {
        if decision_count <= self.low_max {
            ComplexityLevel::Low
        } else if decision_count <= self.medium_max {
            ComplexityLevel::Medium
        } else {
            ComplexityLevel::High
        }
    }
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            low_max: 10,
            medium_max: 20,
        }
    }
}

/// The assessor's verdict for one merged group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Complexity level from the decision count.
    pub complexity: ComplexityLevel,
    /// Risk level from the decision contents.
    pub risk: RiskLevel,
    /// Warnings to surface in the report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Assesses one group's decision log.
///
/// Risk rules, highest verdict wins: any identifier conflict is high
/// (with a warning naming the field), any decision below
/// [`LOW_CONFIDENCE_THRESHOLD`] is medium, otherwise low.
#[must_use]
pub fn assess(
    group_key: &str,
    decisions: &[MergeDecision],
    thresholds: &ComplexityThresholds,
) -> Assessment {
    let complexity = thresholds.level_for(decisions.len());

    let mut warnings = Vec::new();
    let mut risk = RiskLevel::Low;

    for decision in decisions {
        if decision.kind == FieldKind::Identifier {
            risk = RiskLevel::High;
            let message = format!(
                "identifier conflict on '{}': {} differing values merged",
                decision.field,
                decision.values_considered.len()
            );
            warn!(group = group_key, field = decision.field.as_str(), "identifier conflict");
            warnings.push(message);
        } else if decision.is_low_confidence(LOW_CONFIDENCE_THRESHOLD) && risk < RiskLevel::Medium {
            risk = RiskLevel::Medium;
        }
    }

    Assessment {
        complexity,
        risk,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionId;
    use crate::strategy::StrategyName;
    use crate::value::FieldValue;

    fn decision(field: &str, kind: FieldKind, strategy: StrategyName, confidence: f32) -> MergeDecision {
        MergeDecision {
            id: DecisionId::new(),
            field: field.to_string(),
            kind,
            strategy,
            confidence,
            values_considered: vec![FieldValue::from("a"), FieldValue::from("b")],
            result: FieldValue::from("a"),
            notes: Vec::new(),
        }
    }

    fn routine(n: usize) -> Vec<MergeDecision> {
        (0..n)
            .map(|i| {
                decision(
                    &format!("field_{i}"),
                    FieldKind::Comment,
                    StrategyName::ConcatenateStrings,
                    0.8,
                )
            })
            .collect()
    }

    #[test]
    fn test_complexity_boundaries() {
        let thresholds = ComplexityThresholds::default();
        assert_eq!(thresholds.level_for(0), ComplexityLevel::Low);
        assert_eq!(thresholds.level_for(10), ComplexityLevel::Low);
        assert_eq!(thresholds.level_for(11), ComplexityLevel::Medium);
        assert_eq!(thresholds.level_for(20), ComplexityLevel::Medium);
        assert_eq!(thresholds.level_for(21), ComplexityLevel::High);
    }

    #[test]
    fn test_custom_thresholds_validated() {
        let thresholds = ComplexityThresholds::new(2, 5).unwrap();
        assert_eq!(thresholds.level_for(3), ComplexityLevel::Medium);

        assert!(ComplexityThresholds::new(5, 5).is_err());
        assert!(ComplexityThresholds::new(9, 3).is_err());
    }

    #[test]
    fn test_low_risk_for_routine_decisions() {
        let verdict = assess("k", &routine(3), &ComplexityThresholds::default());
        assert_eq!(verdict.risk, RiskLevel::Low);
        assert_eq!(verdict.complexity, ComplexityLevel::Low);
        assert!(verdict.warnings.is_empty());
    }

    #[test]
    fn test_low_confidence_raises_to_medium() {
        let mut decisions = routine(2);
        decisions.push(decision(
            "Notes",
            FieldKind::Other,
            StrategyName::FirstNonNull,
            0.5,
        ));
        let verdict = assess("k", &decisions, &ComplexityThresholds::default());
        assert_eq!(verdict.risk, RiskLevel::Medium);
        assert!(verdict.warnings.is_empty());
    }

    #[test]
    fn test_identifier_conflict_is_high_with_warning() {
        let decisions = vec![decision(
            "Asset ID",
            FieldKind::Identifier,
            StrategyName::PrimaryKey,
            1.0,
        )];
        let verdict = assess("2023-001", &decisions, &ComplexityThresholds::default());
        assert_eq!(verdict.risk, RiskLevel::High);
        assert_eq!(verdict.warnings.len(), 1);
        assert!(verdict.warnings[0].contains("Asset ID"));
        assert!(verdict.warnings[0].contains("identifier conflict"));
    }

    #[test]
    fn test_identifier_beats_low_confidence() {
        let decisions = vec![
            decision("Notes", FieldKind::Other, StrategyName::FirstNonNull, 0.5),
            decision("Asset ID", FieldKind::Identifier, StrategyName::PrimaryKey, 1.0),
        ];
        let verdict = assess("k", &decisions, &ComplexityThresholds::default());
        assert_eq!(verdict.risk, RiskLevel::High);
    }

    #[test]
    fn test_no_decisions_is_low_everything() {
        let verdict = assess("k", &[], &ComplexityThresholds::default());
        assert_eq!(verdict.risk, RiskLevel::Low);
        assert_eq!(verdict.complexity, ComplexityLevel::Low);
    }

    #[test]
    fn test_levels_order_and_display() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(format!("{}", ComplexityLevel::Medium), "medium");
        assert_eq!(format!("{}", RiskLevel::High), "high");
    }
}
