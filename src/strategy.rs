//! Merge strategies and the kind-to-strategy registry.
//!
//! Strategies are intentionally *pure* (no I/O) so a merge result can be
//! reproduced deterministically given the same group. Each strategy takes
//! the candidate values in first-seen record order and returns a result
//! with a fixed confidence; ties always keep the earliest candidate.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::classify::FieldKind;
use crate::value::FieldValue;

/// Date formats accepted by [`StrategyName::LatestDate`], tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y"];

/// A merge strategy identifier.
///
/// The variant set is closed: every field kind maps to one of these, and
/// per-field overrides select among them. Confidence values are fixed per
/// strategy, not per invocation, so two runs over the same group always
/// score identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    /// First non-empty value wins; identifiers should already agree.
    PrimaryKey,
    /// Union of list elements, first occurrence kept.
    MergeLists,
    /// Distinct text values joined with `" | "`.
    ConcatenateStrings,
    /// Most recent parseable date wins.
    LatestDate,
    /// Most advanced status per the configured ranking wins.
    PrioritizeStatus,
    /// Largest numeric value wins.
    MaxNumeric,
    /// Any affirmative value wins, canonicalized to `"Yes"`.
    PrioritizeYes,
    /// First value that is neither null nor empty.
    FirstNonNull,
}

impl StrategyName {
    /// Returns a short stable identifier suitable for logging and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PrimaryKey => "primary_key",
            Self::MergeLists => "merge_lists",
            Self::ConcatenateStrings => "concatenate_strings",
            Self::LatestDate => "latest_date",
            Self::PrioritizeStatus => "prioritize_status",
            Self::MaxNumeric => "max_numeric",
            Self::PrioritizeYes => "prioritize_yes",
            Self::FirstNonNull => "first_non_null",
        }
    }

    /// The fixed confidence this strategy reports on success.
    ///
    /// [`Self::LatestDate`] drops to `0.0` when no candidate parses; every
    /// other strategy reports its table value unconditionally.
    #[must_use]
    pub const fn confidence(&self) -> f32 {
        match self {
            Self::PrimaryKey => 1.0,
            Self::MergeLists => 0.9,
            Self::LatestDate => 0.85,
            Self::ConcatenateStrings | Self::MaxNumeric | Self::PrioritizeYes => 0.8,
            Self::PrioritizeStatus => 0.75,
            Self::FirstNonNull => 0.5,
        }
    }

    /// Applies the strategy to candidate values in first-seen order.
    #[must_use]
    pub fn apply(&self, candidates: &[FieldValue], ctx: &StrategyContext<'_>) -> StrategyResult {
        match self {
            Self::PrimaryKey => first_usable(candidates, self.confidence()),
            Self::MergeLists => merge_lists(candidates),
            Self::ConcatenateStrings => concatenate_strings(candidates),
            Self::LatestDate => latest_date(candidates),
            Self::PrioritizeStatus => prioritize_status(candidates, ctx.status_ranking),
            Self::MaxNumeric => max_numeric(candidates),
            Self::PrioritizeYes => prioritize_yes(candidates),
            Self::FirstNonNull => first_usable(candidates, self.confidence()),
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared configuration strategies read from.
///
/// Borrowed from [`crate::MergeConfig`] for the duration of one group
/// merge; strategies never mutate it.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    /// Status values ordered most-advanced-first.
    pub status_ranking: &'a [String],
}

/// The outcome of applying one strategy to one field's candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    /// The merged value.
    pub value: FieldValue,
    /// Confidence in the result, 0.0 to 1.0.
    pub confidence: f32,
    /// Human-readable notes, e.g. for values excluded as unparseable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl StrategyResult {
    fn new(value: FieldValue, confidence: f32) -> Self {
        Self {
            value,
            confidence,
            notes: Vec::new(),
        }
    }

    fn with_notes(value: FieldValue, confidence: f32, notes: Vec<String>) -> Self {
        Self {
            value,
            confidence,
            notes,
        }
    }
}

/// True for values that carry no usable content.
fn is_blank(value: &FieldValue) -> bool {
    value.is_null() || value.is_empty_string()
}

/// First candidate that is neither null nor the empty string.
fn first_usable(candidates: &[FieldValue], confidence: f32) -> StrategyResult {
    let value = candidates
        .iter()
        .find(|v| !is_blank(v))
        .cloned()
        .unwrap_or(FieldValue::Null);
    StrategyResult::new(value, confidence)
}

/// Union of elements across candidates, first occurrence kept.
///
/// Lists contribute their elements in order; scalars contribute their text
/// rendering as a single element; nulls contribute nothing. Equality is
/// exact string equality.
fn merge_lists(candidates: &[FieldValue]) -> StrategyResult {
    let mut merged: Vec<String> = Vec::new();
    for candidate in candidates {
        match candidate {
            FieldValue::List(items) => {
                for item in items {
                    if !merged.contains(item) {
                        merged.push(item.clone());
                    }
                }
            }
            other => {
                if let Some(text) = other.as_text() {
                    if !merged.contains(&text) {
                        merged.push(text);
                    }
                }
            }
        }
    }
    StrategyResult::new(
        FieldValue::List(merged),
        StrategyName::MergeLists.confidence(),
    )
}

/// Distinct text renderings joined with `" | "` in first-seen order.
fn concatenate_strings(candidates: &[FieldValue]) -> StrategyResult {
    let mut parts: Vec<String> = Vec::new();
    for candidate in candidates {
        if let Some(text) = candidate.as_text() {
            if !text.is_empty() && !parts.contains(&text) {
                parts.push(text);
            }
        }
    }
    let value = if parts.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::String(parts.join(" | "))
    };
    StrategyResult::new(value, StrategyName::ConcatenateStrings.confidence())
}

/// Parses the date formats `latest_date` accepts.
///
/// RFC 3339 timestamps are normalized to UTC; bare dates read as
/// midnight. Comparison happens on the parsed value; the winning
/// candidate keeps its original text.
fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Most recent parseable date wins; ties keep the earliest candidate.
fn latest_date(candidates: &[FieldValue]) -> StrategyResult {
    let mut best: Option<(NaiveDateTime, &FieldValue)> = None;
    let mut notes = Vec::new();

    for candidate in candidates {
        if candidate.is_null() {
            continue;
        }
        let parsed = candidate.as_str().and_then(parse_date);
        match parsed {
            Some(instant) => {
                // Strict comparison keeps the first-seen candidate on ties.
                if best.is_none_or(|(current, _)| instant > current) {
                    best = Some((instant, candidate));
                }
            }
            None => notes.push(format!("unparseable date: {candidate}")),
        }
    }

    match best {
        Some((_, winner)) => StrategyResult::with_notes(
            winner.clone(),
            StrategyName::LatestDate.confidence(),
            notes,
        ),
        None => StrategyResult::with_notes(FieldValue::Null, 0.0, notes),
    }
}

/// Most advanced status per the ranking wins.
///
/// Ranking entries compare case-insensitively against the candidate's
/// text; values absent from the ranking sort after every listed value.
/// Ties keep the earliest candidate.
fn prioritize_status(candidates: &[FieldValue], ranking: &[String]) -> StrategyResult {
    let rank_of = |value: &FieldValue| -> usize {
        value
            .as_text()
            .and_then(|text| {
                let trimmed = text.trim().to_lowercase();
                ranking
                    .iter()
                    .position(|entry| entry.to_lowercase() == trimmed)
            })
            .unwrap_or(usize::MAX)
    };

    let mut best: Option<(usize, &FieldValue)> = None;
    for candidate in candidates {
        if is_blank(candidate) {
            continue;
        }
        let rank = rank_of(candidate);
        if best.is_none_or(|(current, _)| rank < current) {
            best = Some((rank, candidate));
        }
    }

    let value = best.map_or(FieldValue::Null, |(_, winner)| winner.clone());
    StrategyResult::new(value, StrategyName::PrioritizeStatus.confidence())
}

/// Largest finite numeric value wins; ties keep the earliest candidate.
fn max_numeric(candidates: &[FieldValue]) -> StrategyResult {
    let numeric_of = |value: &FieldValue| -> Option<f64> {
        value
            .as_float()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
            .filter(|n| !n.is_nan())
    };

    let mut best: Option<(f64, &FieldValue)> = None;
    let mut notes = Vec::new();
    for candidate in candidates {
        if candidate.is_null() {
            continue;
        }
        match numeric_of(candidate) {
            Some(number) => {
                if best.is_none_or(|(current, _)| number > current) {
                    best = Some((number, candidate));
                }
            }
            None => notes.push(format!("unparseable number: {candidate}")),
        }
    }

    let value = best.map_or(FieldValue::Null, |(_, winner)| winner.clone());
    StrategyResult::with_notes(value, StrategyName::MaxNumeric.confidence(), notes)
}

/// True for `Bool(true)` and affirmative text (`"yes"`/`"true"`).
fn is_affirmative(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(flag) => *flag,
        FieldValue::String(text) => {
            let lowered = text.trim().to_lowercase();
            lowered == "yes" || lowered == "true"
        }
        _ => false,
    }
}

/// Any affirmative candidate wins, canonicalized to `"Yes"`.
fn prioritize_yes(candidates: &[FieldValue]) -> StrategyResult {
    let confidence = StrategyName::PrioritizeYes.confidence();
    if candidates.iter().any(is_affirmative) {
        return StrategyResult::new(FieldValue::String("Yes".to_string()), confidence);
    }
    first_usable(candidates, confidence)
}

/// The field-kind to strategy registry.
///
/// The default table is fixed; per-field-name overrides take precedence
/// over the kind-based default.
///
/// # Examples
///
/// ```
/// use dedup_engine::{FieldKind, StrategyName, StrategyRegistry};
///
/// let registry = StrategyRegistry::new();
/// assert_eq!(
///     registry.strategy_for("Closed Date", FieldKind::Date),
///     StrategyName::LatestDate
/// );
///
/// let mut registry = StrategyRegistry::new();
/// registry.set_override("Closed Date", StrategyName::FirstNonNull);
/// assert_eq!(
///     registry.strategy_for("Closed Date", FieldKind::Date),
///     StrategyName::FirstNonNull
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRegistry {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    overrides: HashMap<String, StrategyName>,
}

impl StrategyRegistry {
    /// Creates a registry with the default kind table and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the given per-field overrides.
    #[must_use]
    pub fn with_overrides(overrides: HashMap<String, StrategyName>) -> Self {
        Self { overrides }
    }

    /// The default strategy for a field kind.
    #[must_use]
    pub const fn default_for(kind: FieldKind) -> StrategyName {
        match kind {
            FieldKind::Identifier => StrategyName::PrimaryKey,
            FieldKind::Date => StrategyName::LatestDate,
            FieldKind::Status => StrategyName::PrioritizeStatus,
            FieldKind::List => StrategyName::MergeLists,
            FieldKind::Comment => StrategyName::ConcatenateStrings,
            FieldKind::Numeric => StrategyName::MaxNumeric,
            FieldKind::Boolean => StrategyName::PrioritizeYes,
            FieldKind::Other => StrategyName::FirstNonNull,
        }
    }

    /// Resolves the strategy for a field, override first.
    #[must_use]
    pub fn strategy_for(&self, field_name: &str, kind: FieldKind) -> StrategyName {
        self.overrides
            .get(field_name)
            .copied()
            .unwrap_or_else(|| Self::default_for(kind))
    }

    /// Sets a per-field override.
    pub fn set_override(&mut self, field_name: impl Into<String>, strategy: StrategyName) {
        self.overrides.insert(field_name.into(), strategy);
    }

    /// Returns the per-field overrides.
    #[must_use]
    pub fn overrides(&self) -> &HashMap<String, StrategyName> {
        &self.overrides
    }
}
