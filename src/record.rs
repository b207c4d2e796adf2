//! Record type—an order-preserving map from field name to value.
//!
//! Datasets in this engine are sparse: records share a field vocabulary
//! but any record may omit any field. Absence, null, and the empty
//! string are three distinguishable states, which the union-of-fields
//! merge rule depends on. Field insertion order is preserved so merged
//! output and serialized form are deterministic.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::FieldValue;

/// Reserved output field carrying the merged flag.
pub const WAS_MERGED_FIELD: &str = "_was_merged";

/// Reserved output field carrying the merge metadata block.
pub const MERGE_METADATA_FIELD: &str = "_merge_metadata";

/// One input data item: a mapping from field name to value.
///
/// Backed by an insertion-ordered vector of pairs. Lookups are linear,
/// which is the right trade for the small field counts these datasets
/// carry.
///
/// # Examples
///
/// ```
/// use dedup_engine::{FieldValue, Record};
///
/// let mut record = Record::new();
/// record.insert("Action Request Number", "2023-001");
/// record.insert("Root Cause", FieldValue::from(vec!["Bearing wear"]));
///
/// assert_eq!(record.len(), 2);
/// assert!(record.contains_field("Root Cause"));
/// assert!(!record.contains_field("Action Plan"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Creates an empty record with preallocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or replaces a field value.
    ///
    /// Replacing keeps the field's original position, so insertion order
    /// stays stable under updates.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Returns the value of a field, if present.
    ///
    /// `None` means the field is absent; `Some(FieldValue::Null)` means
    /// it is present but null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns true if the field is present (even if null).
    #[must_use]
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterates field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Returns true if the record uses either reserved output field name.
    #[must_use]
    pub fn has_reserved_fields(&self) -> bool {
        self.contains_field(WAS_MERGED_FIELD) || self.contains_field(MERGE_METADATA_FIELD)
    }
}

impl<S: Into<String>, V: Into<FieldValue>> FromIterator<(S, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl<S: Into<String>, V: Into<FieldValue>> From<Vec<(S, V)>> for Record {
    fn from(pairs: Vec<(S, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl Serialize for Record {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of field names to values")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut record = Record::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, FieldValue>()? {
            record.insert(name, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor)
    }
}
