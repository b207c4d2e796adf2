//! Engine configuration and its validating builder.
//!
//! Configuration is immutable once built. All validation happens in
//! [`MergeConfigBuilder::build`], so a constructed [`MergeConfig`] is
//! always usable: the key field is non-empty, thresholds are ordered,
//! classifier regex rules compile, and the status ranking is normalized.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::assess::ComplexityThresholds;
use crate::classify::{ClassifierRule, ClassifierRules};
use crate::error::ConfigError;
use crate::strategy::{StrategyName, StrategyRegistry};

/// Status values ordered most-advanced-first, used when no ranking is
/// configured.
const DEFAULT_STATUS_RANKING: [&str; 7] = [
    "Closed",
    "Completed",
    "Verified",
    "In Progress",
    "Pending",
    "Open",
    "Draft",
];

/// Immutable engine configuration.
///
/// # Examples
///
/// ```
/// use dedup_engine::{MergeConfig, StrategyName};
///
/// let config = MergeConfig::builder("Action Request Number")
///     .complexity_thresholds(5, 15)
///     .strategy_override("Days Open", StrategyName::FirstNonNull)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.key_field(), "Action Request Number");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    key_field: String,
    classifier: ClassifierRules,
    registry: StrategyRegistry,
    status_ranking: Vec<String>,
    thresholds: ComplexityThresholds,
}

impl MergeConfig {
    /// Starts a builder for the given key field.
    #[must_use]
    pub fn builder(key_field: impl Into<String>) -> MergeConfigBuilder {
        MergeConfigBuilder::new(key_field)
    }

    /// The field records are grouped by.
    #[must_use]
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// The classifier rule table.
    #[must_use]
    pub fn classifier(&self) -> &ClassifierRules {
        &self.classifier
    }

    /// The strategy registry.
    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Status values ordered most-advanced-first.
    #[must_use]
    pub fn status_ranking(&self) -> &[String] {
        &self.status_ranking
    }

    /// Complexity thresholds.
    #[must_use]
    pub fn thresholds(&self) -> &ComplexityThresholds {
        &self.thresholds
    }
}

/// Builder for [`MergeConfig`].
///
/// Setters consume and return the builder; [`Self::build`] validates
/// everything at once.
#[derive(Debug, Clone)]
pub struct MergeConfigBuilder {
    key_field: String,
    classifier: ClassifierRules,
    status_ranking: Vec<String>,
    low_max: usize,
    medium_max: usize,
    overrides: HashMap<String, StrategyName>,
}

impl MergeConfigBuilder {
    fn new(key_field: impl Into<String>) -> Self {
        let defaults = ComplexityThresholds::default();
        Self {
            key_field: key_field.into(),
            classifier: ClassifierRules::standard(),
            status_ranking: DEFAULT_STATUS_RANKING
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            low_max: defaults.low_max,
            medium_max: defaults.medium_max,
            overrides: HashMap::new(),
        }
    }

    /// Replaces the classifier rule table.
    #[must_use]
    pub fn classifier(mut self, rules: ClassifierRules) -> Self {
        self.classifier = rules;
        self
    }

    /// Replaces the status ranking (most-advanced-first).
    #[must_use]
    pub fn status_ranking<I, S>(mut self, ranking: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status_ranking = ranking.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the complexity thresholds.
    #[must_use]
    pub fn complexity_thresholds(mut self, low_max: usize, medium_max: usize) -> Self {
        self.low_max = low_max;
        self.medium_max = medium_max;
        self
    }

    /// Adds a per-field strategy override.
    #[must_use]
    pub fn strategy_override(
        mut self,
        field_name: impl Into<String>,
        strategy: StrategyName,
    ) -> Self {
        self.overrides.insert(field_name.into(), strategy);
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the key field is empty, thresholds
    /// are not strictly increasing, a classifier rule has an empty
    /// keyword set or an invalid regex, or a status ranking entry is
    /// blank.
    pub fn build(self) -> Result<MergeConfig, ConfigError> {
        if self.key_field.trim().is_empty() {
            return Err(ConfigError::EmptyKeyField);
        }

        let thresholds = ComplexityThresholds::new(self.low_max, self.medium_max)?;

        for rule in self.classifier.rules() {
            match rule {
                ClassifierRule::Keywords { kind, keywords } => {
                    if keywords.is_empty() || keywords.iter().any(|k| k.trim().is_empty()) {
                        return Err(ConfigError::EmptyKeywordSet {
                            kind: kind.to_string(),
                        });
                    }
                }
                ClassifierRule::Regex { pattern, .. } => {
                    if let Err(e) = regex::Regex::new(pattern) {
                        return Err(ConfigError::InvalidClassifierRegex {
                            pattern: pattern.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        if self.status_ranking.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptyStatusEntry);
        }
        // Duplicate entries are ignored, first occurrence wins.
        let mut seen = HashSet::new();
        let status_ranking: Vec<String> = self
            .status_ranking
            .into_iter()
            .filter(|s| seen.insert(s.to_lowercase()))
            .collect();

        Ok(MergeConfig {
            key_field: self.key_field,
            classifier: self.classifier,
            registry: StrategyRegistry::with_overrides(self.overrides),
            status_ranking,
            thresholds,
        })
    }
}
