//! The run report: per-group audits, run totals, and the output digest.
//!
//! The report is the caller-facing audit trail. Everything in it is also
//! reachable through the reserved metadata fields on the merged records;
//! the report just collects it in one serializable place, ordered the
//! same way as the output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assess::{ComplexityLevel, RiskLevel};
use crate::decision::{MergeDecision, RunId};
use crate::error::{MergeError, MergeResult};
use crate::record::Record;

/// One group's entry in the report, in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAudit {
    /// The group's key value, `None` for keyless singletons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// How many source records the group held.
    pub group_size: usize,

    /// Whether the group actually merged multiple records.
    pub was_merged: bool,

    /// Complexity level from the decision count.
    pub complexity: ComplexityLevel,

    /// Risk level from the decision contents.
    pub risk: RiskLevel,

    /// Warnings raised for the group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Every decision recorded for the group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<MergeDecision>,
}

impl GroupAudit {
    /// The key rendered for display.
    #[must_use]
    pub fn key_label(&self) -> &str {
        self.key.as_deref().unwrap_or("<keyless>")
    }
}

/// The full report for one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Unique identifier for the run.
    pub run_id: RunId,

    /// When the run finished.
    pub merged_at: DateTime<Utc>,

    /// Number of input records.
    pub input_records: usize,

    /// Number of output records.
    pub output_records: usize,

    /// Number of groups holding more than one record.
    pub duplicate_groups: usize,

    /// Per-group audits in output order.
    pub groups: Vec<GroupAudit>,

    /// Hex blake3 digest of the canonical JSON of the merged records.
    ///
    /// Two runs over the same input under the same configuration produce
    /// the same digest, which makes determinism externally checkable.
    pub output_digest: String,
}

impl MergeReport {
    /// Total number of decisions across all groups.
    #[must_use]
    pub fn decision_count(&self) -> usize {
        self.groups.iter().map(|g| g.decisions.len()).sum()
    }

    /// Number of groups at the given risk level.
    #[must_use]
    pub fn groups_at_risk(&self, risk: RiskLevel) -> usize {
        self.groups.iter().filter(|g| g.risk == risk).count()
    }

    /// All warnings across all groups, in output order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.warnings.iter().map(String::as_str))
    }

    /// Renders a human-readable run summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "merge run {}", self.run_id);
        let _ = writeln!(out, "  input records:    {}", self.input_records);
        let _ = writeln!(out, "  output records:   {}", self.output_records);
        let _ = writeln!(out, "  duplicate groups: {}", self.duplicate_groups);
        let _ = writeln!(out, "  decisions:        {}", self.decision_count());
        let _ = writeln!(
            out,
            "  risk:             {} high, {} medium, {} low",
            self.groups_at_risk(RiskLevel::High),
            self.groups_at_risk(RiskLevel::Medium),
            self.groups_at_risk(RiskLevel::Low)
        );
        let _ = writeln!(out, "  output digest:    {}", self.output_digest);

        for audit in self.groups.iter().filter(|g| g.was_merged) {
            let _ = writeln!(
                out,
                "  group '{}': {} records, {} decisions, complexity {}, risk {}",
                audit.key_label(),
                audit.group_size,
                audit.decisions.len(),
                audit.complexity,
                audit.risk
            );
            for warning in &audit.warnings {
                let _ = writeln!(out, "    warning: {warning}");
            }
        }
        out
    }
}

/// Hashes the merged output into a stable hex digest.
///
/// The digest is computed over the canonical JSON rendering of the record
/// sequence, so field order and value formatting feed into it.
pub fn output_digest(records: &[Record]) -> MergeResult<String> {
    let canonical = serde_json::to_vec(records)
        .map_err(|e| MergeError::internal(format!("serializing merged output: {e}")))?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FieldKind;
    use crate::decision::DecisionId;
    use crate::strategy::StrategyName;
    use crate::value::FieldValue;

    fn audit(key: &str, risk: RiskLevel, decisions: usize) -> GroupAudit {
        GroupAudit {
            key: Some(key.to_string()),
            group_size: 2,
            was_merged: true,
            complexity: ComplexityLevel::Low,
            risk,
            warnings: Vec::new(),
            decisions: (0..decisions)
                .map(|i| MergeDecision {
                    id: DecisionId::new(),
                    field: format!("field_{i}"),
                    kind: FieldKind::Other,
                    strategy: StrategyName::FirstNonNull,
                    confidence: 0.5,
                    values_considered: vec![FieldValue::from("a"), FieldValue::from("b")],
                    result: FieldValue::from("a"),
                    notes: Vec::new(),
                })
                .collect(),
        }
    }

    fn report() -> MergeReport {
        MergeReport {
            run_id: RunId::new(),
            merged_at: Utc::now(),
            input_records: 5,
            output_records: 3,
            duplicate_groups: 2,
            groups: vec![
                audit("2023-001", RiskLevel::High, 2),
                audit("2023-002", RiskLevel::Low, 1),
            ],
            output_digest: "abc123".to_string(),
        }
    }

    #[test]
    fn test_decision_and_risk_totals() {
        let report = report();
        assert_eq!(report.decision_count(), 3);
        assert_eq!(report.groups_at_risk(RiskLevel::High), 1);
        assert_eq!(report.groups_at_risk(RiskLevel::Low), 1);
        assert_eq!(report.groups_at_risk(RiskLevel::Medium), 0);
    }

    #[test]
    fn test_summary_names_groups_and_totals() {
        let rendered = report().summary();
        assert!(rendered.contains("input records:    5"));
        assert!(rendered.contains("output records:   3"));
        assert!(rendered.contains("group '2023-001'"));
        assert!(rendered.contains("risk high"));
    }

    #[test]
    fn test_digest_is_stable_and_order_sensitive() {
        let a = Record::from(vec![("id", "1"), ("v", "x")]);
        let b = Record::from(vec![("id", "2"), ("v", "y")]);

        let d1 = output_digest(&[a.clone(), b.clone()]).unwrap();
        let d2 = output_digest(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);

        let reversed = output_digest(&[b, a]).unwrap();
        assert_ne!(d1, reversed);
    }

    #[test]
    fn test_report_serde_round_trip() {
        let report = report();
        let json = serde_json::to_string(&report).unwrap();
        let back: MergeReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_keyless_audit_label() {
        let mut audit = audit("x", RiskLevel::Low, 0);
        audit.key = None;
        assert_eq!(audit.key_label(), "<keyless>");
    }
}
