//! Pre-merge structural checks and post-merge integrity checks.
//!
//! The engine refuses to start on structurally unusable input and refuses
//! to return output that fails integrity. Integrity checks recompute what
//! the executor should have done from the source group, so a bug in the
//! executor surfaces as a violation instead of silent data loss.

use tracing::debug;

use crate::error::{IntegrityError, StructuralError};
use crate::executor::MergedDraft;
use crate::group::DuplicateGroup;
use crate::record::{Record, MERGE_METADATA_FIELD, WAS_MERGED_FIELD};

/// Checks input before any grouping or merging.
///
/// Rejects empty input, input that already uses a reserved output field,
/// and a key field that exists in no record at all. A key field missing
/// from *some* records is fine; those records become keyless singletons.
pub fn pre_merge_check(records: &[Record], key_field: &str) -> Result<(), StructuralError> {
    if records.is_empty() {
        return Err(StructuralError::EmptyInput);
    }

    for (record_index, record) in records.iter().enumerate() {
        for reserved in [WAS_MERGED_FIELD, MERGE_METADATA_FIELD] {
            if record.contains_field(reserved) {
                return Err(StructuralError::ReservedField {
                    record_index,
                    field: reserved.to_string(),
                });
            }
        }
    }

    if !records.iter().any(|r| r.contains_field(key_field)) {
        return Err(StructuralError::KeyFieldUnknown {
            key_field: key_field.to_string(),
        });
    }

    debug!(records = records.len(), key_field, "pre-merge checks passed");
    Ok(())
}

/// True if any field in the group has two or more distinct present values.
fn has_conflicts(group: &DuplicateGroup) -> bool {
    let mut seen_fields: Vec<&str> = Vec::new();
    for record in &group.records {
        for name in record.field_names() {
            if seen_fields.contains(&name) {
                continue;
            }
            seen_fields.push(name);
            let mut values = group.records.iter().filter_map(|r| r.get(name));
            if let Some(first) = values.next() {
                if values.any(|v| v != first) {
                    return true;
                }
            }
        }
    }
    false
}

/// Verifies one group's draft against its source records.
///
/// Three invariants:
/// - every field present in a source record survives into the output,
/// - every output value is an unchanged copy of a source value or the
///   recorded result of a decision on that field,
/// - a merged group with conflicting source values carries a non-empty
///   decision log.
pub fn check_group_integrity(
    group: &DuplicateGroup,
    draft: &MergedDraft,
) -> Result<(), IntegrityError> {
    let group_key = group.key_label();

    for record in &group.records {
        for (field, _) in record.iter() {
            if !draft.record.contains_field(field) {
                return Err(IntegrityError::DroppedField {
                    group_key: group_key.to_string(),
                    field: field.to_string(),
                });
            }
        }
    }

    for (field, value) in draft.record.iter() {
        let unchanged_copy = group
            .records
            .iter()
            .any(|r| r.get(field).is_some_and(|v| v == value));
        let decided = draft
            .decisions
            .iter()
            .any(|d| d.field == field && d.result == *value);
        if !unchanged_copy && !decided {
            return Err(IntegrityError::UntraceableValue {
                group_key: group_key.to_string(),
                field: field.to_string(),
            });
        }
    }

    if draft.was_merged && draft.decisions.is_empty() && has_conflicts(group) {
        return Err(IntegrityError::EmptyDecisionLog {
            group_key: group_key.to_string(),
        });
    }

    Ok(())
}

/// Verifies the run-level count arithmetic.
///
/// Each group of size `n` collapses `n - 1` records, so the output count
/// must equal the input count minus the sum of collapses, which is also
/// the group count.
pub fn post_merge_check(
    input_count: usize,
    groups: &[DuplicateGroup],
    output_count: usize,
) -> Result<(), IntegrityError> {
    let collapsed: usize = groups.iter().map(|g| g.len().saturating_sub(1)).sum();
    let expected = input_count - collapsed;
    if output_count != expected {
        return Err(IntegrityError::CountMismatch {
            expected,
            actual: output_count,
        });
    }
    debug!(input_count, output_count, "post-merge checks passed");
    Ok(())
}
