//! The merge executor: collapses one duplicate group into one record.
//!
//! The executor produces a *draft*: the merged record plus the decision
//! log. Assessment, integrity checking, and metadata assembly happen in
//! the engine afterwards, so a draft is never visible to callers.

use tracing::debug;

use crate::config::MergeConfig;
use crate::decision::{DecisionId, MergeDecision};
use crate::group::DuplicateGroup;
use crate::record::Record;
use crate::strategy::StrategyContext;
use crate::value::FieldValue;

/// The executor's output for one group, before metadata assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDraft {
    /// The merged record, without reserved fields.
    pub record: Record,

    /// One decision per field whose values differed.
    pub decisions: Vec<MergeDecision>,

    /// Fields whose present values differed across the group.
    pub differing_fields: Vec<String>,

    /// False for singleton pass-through.
    pub was_merged: bool,
}

/// Union of field names across the group, in first-seen order.
fn field_union(group: &DuplicateGroup) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for record in &group.records {
        for name in record.field_names() {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
    }
    fields
}

/// Distinct values in first-seen order, by exact equality.
fn distinct(values: &[FieldValue]) -> Vec<FieldValue> {
    let mut seen: Vec<FieldValue> = Vec::new();
    for value in values {
        if !seen.contains(value) {
            seen.push(value.clone());
        }
    }
    seen
}

/// Merges one duplicate group into a single record draft.
///
/// Singletons pass through unchanged with `was_merged = false`. For
/// larger groups the output carries the union of all field names; a field
/// whose present values all agree is copied without a decision, and a
/// field with differing values is resolved by the registry strategy with
/// a recorded [`MergeDecision`]. Absent fields never vote: a field
/// present in only one record keeps that record's value.
#[must_use]
pub fn merge_group(group: &DuplicateGroup, config: &MergeConfig) -> MergedDraft {
    if group.is_singleton() {
        return MergedDraft {
            record: group.records[0].clone(),
            decisions: Vec::new(),
            differing_fields: Vec::new(),
            was_merged: false,
        };
    }

    let ctx = StrategyContext {
        status_ranking: config.status_ranking(),
    };

    let fields = field_union(group);
    let mut record = Record::with_capacity(fields.len());
    let mut decisions = Vec::new();
    let mut differing_fields = Vec::new();

    for field in &fields {
        let candidates: Vec<FieldValue> = group
            .records
            .iter()
            .filter_map(|r| r.get(field))
            .cloned()
            .collect();

        let values = distinct(&candidates);
        if let [only] = values.as_slice() {
            record.insert(field.clone(), only.clone());
            continue;
        }

        let kind = config.classifier().classify(field);
        let strategy = config.registry().strategy_for(field, kind);
        let outcome = strategy.apply(&candidates, &ctx);

        debug!(
            group = group.key_label(),
            field = field.as_str(),
            %kind,
            %strategy,
            candidates = values.len(),
            "resolved field conflict"
        );

        record.insert(field.clone(), outcome.value.clone());
        differing_fields.push(field.clone());
        decisions.push(MergeDecision {
            id: DecisionId::new(),
            field: field.clone(),
            kind,
            strategy,
            confidence: outcome.confidence,
            values_considered: values,
            result: outcome.value,
            notes: outcome.notes,
        });
    }

    MergedDraft {
        record,
        decisions,
        differing_fields,
        was_merged: true,
    }
}
