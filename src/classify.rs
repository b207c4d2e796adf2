//! Field classification—mapping field names to semantic kinds.
//!
//! Classification is rule-based: an ordered list of rules is tested
//! against the lower-cased field name and the first match wins, so rule
//! order encodes priority. The order is data, not logic: it ships as
//! [`ClassifierRules::standard`] and callers may supply their own table
//! when the defaults are wrong for a dataset.

use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};

const REGEX_CACHE_MAX: usize = 256;

static REGEX_CACHE: OnceLock<RwLock<HashMap<String, regex::Regex>>> = OnceLock::new();

/// Compiles a rule regex through a bounded process-wide cache.
///
/// Returns `None` for invalid patterns; configuration building validates
/// patterns up front, so a miss here only happens for rule tables built
/// outside the builder.
fn cached_regex(pattern: &str) -> Option<regex::Regex> {
    let cache = REGEX_CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    if let Ok(guard) = cache.read() {
        if let Some(re) = guard.get(pattern) {
            return Some(re.clone());
        }
    }

    let compiled = regex::Regex::new(pattern).ok()?;

    if let Ok(mut guard) = cache.write() {
        if guard.len() >= REGEX_CACHE_MAX {
            // Keep the cache bounded to avoid unbounded memory usage.
            guard.clear();
        }
        guard
            .entry(pattern.to_string())
            .or_insert_with(|| compiled.clone());
    }
    Some(compiled)
}

/// The semantic category a field name is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Identity-bearing fields (keys, codes, reference numbers).
    Identifier,
    /// Calendar dates and timestamps.
    Date,
    /// Workflow status markers.
    Status,
    /// Multi-valued fields (plans, causes, assets).
    List,
    /// Free-text narrative fields.
    Comment,
    /// Quantities and counts.
    Numeric,
    /// Yes/no flags.
    Boolean,
    /// Anything that matched no rule.
    Other,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Date => write!(f, "date"),
            Self::Status => write!(f, "status"),
            Self::List => write!(f, "list"),
            Self::Comment => write!(f, "comment"),
            Self::Numeric => write!(f, "numeric"),
            Self::Boolean => write!(f, "boolean"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A single classification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierRule {
    /// Matches when any keyword is a substring of the lower-cased name.
    Keywords {
        /// Kind assigned on match.
        kind: FieldKind,
        /// Lower-case substrings to test.
        keywords: Vec<String>,
    },

    /// Matches when the regex matches the lower-cased name.
    Regex {
        /// Kind assigned on match.
        kind: FieldKind,
        /// Regex pattern, applied to the lower-cased name.
        pattern: String,
    },
}

impl ClassifierRule {
    /// Creates a keyword rule.
    #[must_use]
    pub fn keywords(kind: FieldKind, keywords: &[&str]) -> Self {
        Self::Keywords {
            kind,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Creates a regex rule.
    #[must_use]
    pub fn regex(kind: FieldKind, pattern: impl Into<String>) -> Self {
        Self::Regex {
            kind,
            pattern: pattern.into(),
        }
    }

    /// The kind this rule assigns.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Keywords { kind, .. } | Self::Regex { kind, .. } => *kind,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::Keywords { keywords, .. } => {
                keywords.iter().any(|k| lowered.contains(k.as_str()))
            }
            Self::Regex { pattern, .. } => {
                cached_regex(pattern).is_some_and(|re| re.is_match(lowered))
            }
        }
    }
}

/// An ordered rule table for field classification.
///
/// # Examples
///
/// ```
/// use dedup_engine::{ClassifierRules, FieldKind};
///
/// let rules = ClassifierRules::standard();
/// assert_eq!(rules.classify("Action Request Number"), FieldKind::Identifier);
/// // "Completion Date" matches both date and status keywords; the date
/// // rule is checked first, so date wins.
/// assert_eq!(rules.classify("Completion Date"), FieldKind::Date);
/// assert_eq!(rules.classify("Unrelated Heading"), FieldKind::Other);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassifierRules {
    rules: Vec<ClassifierRule>,
}

impl ClassifierRules {
    /// Builds a rule table from an ordered rule list.
    #[must_use]
    pub fn new(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    /// The standard rule table.
    ///
    /// Priority order: identifier, date, status, list, comment, numeric,
    /// boolean. Date is checked before status so names like
    /// "Completion Date" classify as dates even though they also contain
    /// a status keyword.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            ClassifierRule::keywords(
                FieldKind::Identifier,
                &["id", "number", "key", "identifier", "code", "ref"],
            ),
            ClassifierRule::keywords(
                FieldKind::Date,
                &["date", "time", "due", "completion", "verification"],
            ),
            ClassifierRule::keywords(
                FieldKind::Status,
                &["stage", "complete", "status", "satisfactory", "effective"],
            ),
            ClassifierRule::keywords(FieldKind::List, &["plan", "cause", "action", "asset", "item"]),
            ClassifierRule::keywords(
                FieldKind::Comment,
                &["comment", "description", "happened", "requirement"],
            ),
            ClassifierRule::keywords(
                FieldKind::Numeric,
                &["amount", "days", "count", "quantity", "duration"],
            ),
            ClassifierRule::keywords(FieldKind::Boolean, &["flag", "confirmed", "approved", "recurring"]),
        ])
    }

    /// Classifies a field name.
    ///
    /// Pure and total: the first matching rule wins and unmatched names
    /// fall back to [`FieldKind::Other`].
    #[must_use]
    pub fn classify(&self, field_name: &str) -> FieldKind {
        let lowered = field_name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map_or(FieldKind::Other, ClassifierRule::kind)
    }

    /// Returns the rules in priority order.
    #[must_use]
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_classification() {
        let rules = ClassifierRules::standard();
        assert_eq!(rules.classify("Action Request Number"), FieldKind::Identifier);
        assert_eq!(rules.classify("Asset ID"), FieldKind::Identifier);
        assert_eq!(rules.classify("Work Order Ref"), FieldKind::Identifier);
    }

    #[test]
    fn test_date_beats_status() {
        let rules = ClassifierRules::standard();
        // Contains both "completion"/"date" (date) and "complete" (status).
        assert_eq!(rules.classify("Completion Date"), FieldKind::Date);
        assert_eq!(rules.classify("Verification Due"), FieldKind::Date);
    }

    #[test]
    fn test_status_classification() {
        let rules = ClassifierRules::standard();
        assert_eq!(rules.classify("Workflow Stage"), FieldKind::Status);
        assert_eq!(rules.classify("Satisfactory?"), FieldKind::Status);
    }

    #[test]
    fn test_list_comment_numeric_boolean() {
        let rules = ClassifierRules::standard();
        assert_eq!(rules.classify("Root Cause"), FieldKind::List);
        assert_eq!(rules.classify("What Happened"), FieldKind::Comment);
        assert_eq!(rules.classify("Days Open"), FieldKind::Numeric);
        assert_eq!(rules.classify("Recurring?"), FieldKind::Boolean);
    }

    #[test]
    fn test_other_fallback_is_total() {
        let rules = ClassifierRules::standard();
        assert_eq!(rules.classify(""), FieldKind::Other);
        assert_eq!(rules.classify("Unrelated Heading"), FieldKind::Other);
    }

    #[test]
    fn test_case_insensitive() {
        let rules = ClassifierRules::standard();
        assert_eq!(rules.classify("ACTION REQUEST NUMBER"), FieldKind::Identifier);
        assert_eq!(rules.classify("completion date"), FieldKind::Date);
    }

    #[test]
    fn test_custom_order_overrides_priority() {
        // Status before date flips the "Completion Date" outcome.
        let rules = ClassifierRules::new(vec![
            ClassifierRule::keywords(FieldKind::Status, &["complete"]),
            ClassifierRule::keywords(FieldKind::Date, &["date"]),
        ]);
        assert_eq!(rules.classify("Completion Date"), FieldKind::Status);
    }

    #[test]
    fn test_regex_rule() {
        let rules = ClassifierRules::new(vec![ClassifierRule::regex(
            FieldKind::Identifier,
            r"^[a-z]+_no$",
        )]);
        assert_eq!(rules.classify("serial_no"), FieldKind::Identifier);
        assert_eq!(rules.classify("serial_number_of"), FieldKind::Other);
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let rules = ClassifierRules::new(vec![ClassifierRule::regex(FieldKind::Date, "(unclosed")]);
        assert_eq!(rules.classify("date"), FieldKind::Other);
    }

    #[test]
    fn test_rules_serde_round_trip() {
        let rules = ClassifierRules::standard();
        let json = serde_json::to_string(&rules).unwrap();
        let back: ClassifierRules = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", FieldKind::Identifier), "identifier");
        assert_eq!(format!("{}", FieldKind::Other), "other");
    }
}
