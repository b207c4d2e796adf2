//! Duplicate grouping by key field.
//!
//! Grouping is a single linear pass. Groups appear in the order their key
//! was first seen, and records inside a group keep input order, so the
//! merged output is deterministic for a given input sequence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::value::FieldValue;

/// Records sharing one key value, in input order.
///
/// `key` is `None` for records whose key field was absent or null; those
/// never group with anything and pass through as singletons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The shared key value, rendered as text.
    pub key: Option<String>,

    /// Member records in input order.
    pub records: Vec<Record>,
}

impl DuplicateGroup {
    /// Returns the number of records in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if the group holds a single record.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.records.len() == 1
    }

    /// The key rendered for error messages and reports.
    #[must_use]
    pub fn key_label(&self) -> &str {
        self.key.as_deref().unwrap_or("<keyless>")
    }
}

/// Renders a key value as the text groups are bucketed by.
///
/// Null reads as "no key"; every other value uses its scalar text
/// rendering, so `Int(7)` and `String("7")` land in the same group.
fn key_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        other => other.as_text().or_else(|| Some(other.to_string())),
    }
}

/// Groups records by the value of `key_field`, preserving first-seen order.
///
/// Records with an absent or null key become singleton groups at their
/// input position.
///
/// # Examples
///
/// ```
/// use dedup_engine::{group, Record};
///
/// let records = vec![
///     Record::from(vec![("id", "a"), ("v", "1")]),
///     Record::from(vec![("id", "b"), ("v", "2")]),
///     Record::from(vec![("id", "a"), ("v", "3")]),
/// ];
/// let groups = group(records, "id");
///
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].key.as_deref(), Some("a"));
/// assert_eq!(groups[0].len(), 2);
/// assert_eq!(groups[1].key.as_deref(), Some("b"));
/// ```
#[must_use]
pub fn group(records: Vec<Record>, key_field: &str) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = record.get(key_field).and_then(key_text);
        match key {
            Some(key) => {
                if let Some(&index) = index_by_key.get(&key) {
                    groups[index].records.push(record);
                } else {
                    index_by_key.insert(key.clone(), groups.len());
                    groups.push(DuplicateGroup {
                        key: Some(key),
                        records: vec![record],
                    });
                }
            }
            None => groups.push(DuplicateGroup {
                key: None,
                records: vec![record],
            }),
        }
    }

    groups
}
