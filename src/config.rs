use crate::error::ConfigError;
use crate::types::{ConsolidationType, Severity};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Rule and category priorities plus consolidation strategies
///
/// Every section is optional when loaded from a file; missing sections are
/// empty. [`PriorityConfig::builtin`] is the configuration used when no file
/// is supplied or the supplied one cannot be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorityConfig {
    /// Category names, highest priority first
    #[serde(default)]
    pub category_priorities: Vec<String>,
    /// How related spans are clustered within a sentence
    #[serde(default)]
    pub grouping: GroupingMode,
    /// Explicit priority score per rule id (higher wins)
    #[serde(default)]
    pub rule_specific_priorities: BTreeMap<String, i32>,
    /// Strategies keyed by rule combination, e.g. "citations + mouse_buttons" or "claims + *"
    #[serde(default)]
    pub consolidation_strategies: BTreeMap<String, StrategyConfig>,
    /// Message patterns keyed by consolidation type (overlap, nested, adjacent, ...)
    #[serde(default)]
    pub message_patterns: BTreeMap<String, MessagePattern>,
    #[serde(default)]
    pub severity_escalation: SeverityEscalation,
}

/// A configured way of consolidating a specific combination of rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    /// Rule that leads the consolidated message (optional, defaults to the highest priority rule)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_rule: Option<String>,
    /// Strategy name reported on the consolidated record
    #[serde(default = "default_strategy_name")]
    pub strategy: String,
    /// Message template with `{placeholder}` substitution (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
    /// Suggestion merger overriding the message pattern's (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_merger: Option<SuggestionMerger>,
}

/// Message template and suggestion merger for one consolidation type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MessagePattern {
    pub template: String,
    #[serde(default)]
    pub suggestion_merger: SuggestionMerger,
}

/// How suggestion lists of a group are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionMerger {
    /// Flatten, de-duplicate and keep the three highest ranked
    #[default]
    CombineAndPrioritize,
    /// Keep the single source list with the most text
    UseMostComprehensive,
    /// First suggestion of each source, then the rest, capped at three
    MergeSequentialFixes,
}

/// Severity overrides for combinations of medium findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SeverityEscalation {
    /// Two or more medium findings (optional, defaults to high)
    #[serde(default = "default_multiple_medium")]
    pub multiple_medium: Severity,
    /// One medium finding together with low ones (optional, defaults to medium)
    #[serde(default = "default_medium_with_low")]
    pub medium_with_low: Severity,
}

/// Clustering of related spans within a sentence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// Single pass: a span joins the first group with a member it relates to
    #[default]
    Greedy,
    /// Connected components over all related pairs
    Transitive,
}

/// Serialization format of a config file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn default_strategy_name() -> String {
    crate::priority::PRIORITY_BASED_MERGE.to_string()
}

fn default_multiple_medium() -> Severity {
    Severity::High
}

fn default_medium_with_low() -> Severity {
    Severity::Medium
}

impl Default for SeverityEscalation {
    fn default() -> Self {
        Self {
            multiple_medium: default_multiple_medium(),
            medium_with_low: default_medium_with_low(),
        }
    }
}

impl SeverityEscalation {
    /// Combined severity of a group
    ///
    /// Never lower than the highest input severity.
    pub fn escalate(&self, severities: &[Severity]) -> Severity {
        let Some(max) = severities.iter().copied().max() else {
            return Severity::Low;
        };
        let mediums = severities.iter().filter(|s| **s == Severity::Medium).count();
        let lows = severities.iter().filter(|s| **s == Severity::Low).count();

        let escalated = if max == Severity::High {
            Severity::High
        } else if mediums >= 2 {
            self.multiple_medium
        } else if mediums == 1 && lows >= 1 {
            self.medium_with_low
        } else if mediums == 1 {
            Severity::Medium
        } else {
            Severity::Low
        };
        escalated.max(max)
    }
}

impl PriorityConfig {
    /// Configuration with every section empty
    pub fn empty() -> Self {
        Self {
            category_priorities: Vec::new(),
            rule_specific_priorities: BTreeMap::new(),
            consolidation_strategies: BTreeMap::new(),
            message_patterns: BTreeMap::new(),
            severity_escalation: SeverityEscalation::default(),
            grouping: GroupingMode::default(),
        }
    }

    /// Built-in configuration used when no file is available
    pub fn builtin() -> Self {
        let category_priorities = [
            "legal_information",
            "accessibility",
            "technical_elements",
            "references",
            "language_and_grammar",
            "structure_and_format",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let rule_specific_priorities = [
            ("claims", 100),
            ("accessibility_citations", 85),
            ("mouse_buttons", 60),
            ("citations", 55),
            ("word_usage", 2),
        ]
        .into_iter()
        .map(|(rule, score)| (rule.to_string(), score))
        .collect();

        let mut consolidation_strategies = BTreeMap::new();
        consolidation_strategies.insert(
            "citations + mouse_buttons".to_string(),
            StrategyConfig {
                primary_rule: Some("citations".into()),
                strategy: "reference_interaction_merge".into(),
                message_template: Some(
                    "{primary_issue}; the interaction wording in '{text_span}' also needs attention"
                        .into(),
                ),
                suggestion_merger: Some(SuggestionMerger::MergeSequentialFixes),
            },
        );
        consolidation_strategies.insert(
            "claims + *".to_string(),
            StrategyConfig {
                primary_rule: Some("claims".into()),
                strategy: "legal_priority".into(),
                message_template: Some("{primary_issue} (legal review required)".into()),
                suggestion_merger: None,
            },
        );
        consolidation_strategies.insert(
            "accessibility + language_and_grammar".to_string(),
            StrategyConfig {
                primary_rule: None,
                strategy: "accessibility_first".into(),
                message_template: None,
                suggestion_merger: Some(SuggestionMerger::CombineAndPrioritize),
            },
        );

        Self {
            category_priorities,
            rule_specific_priorities,
            consolidation_strategies,
            ..Self::empty()
        }
    }

    /// Load and validate a config file (.yaml, .yml, .toml or .json)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loading priority config from {}", path.display());
        Self::parse(&content, format)
    }

    /// Load a config file, falling back to [`PriorityConfig::builtin`] on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            debug!("No priority config given, using built-in defaults");
            return Self::builtin();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load priority config {}, using built-in defaults: {}",
                    path.display(),
                    e
                );
                Self::builtin()
            }
        }
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml_ng::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        Ok(match format {
            ConfigFormat::Yaml => serde_yaml_ng::to_string(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Reject data that would otherwise fail deep inside rule matching
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for category in &self.category_priorities {
            if category.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "category_priorities contains an empty name".into(),
                ));
            }
            if !seen.insert(category.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "category '{}' is listed more than once",
                    category
                )));
            }
        }

        if self.rule_specific_priorities.keys().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "rule_specific_priorities contains an empty rule id".into(),
            ));
        }

        for (key, strategy) in &self.consolidation_strategies {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "consolidation_strategies contains an empty key".into(),
                ));
            }
            if strategy.strategy.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "strategy '{}' has an empty strategy name",
                    key
                )));
            }
            if matches!(&strategy.primary_rule, Some(r) if r.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "strategy '{}' has an empty primary_rule",
                    key
                )));
            }
            if matches!(&strategy.message_template, Some(t) if t.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "strategy '{}' has an empty message_template",
                    key
                )));
            }
        }

        for (key, pattern) in &self.message_patterns {
            key.parse::<ConsolidationType>()
                .map_err(|e| ConfigError::Invalid(format!("message_patterns: {}", e)))?;
            if pattern.template.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "message pattern '{}' has an empty template",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Apply `section.key=value` overrides; `value` is read as JSON, else as a string
    ///
    /// The config is left untouched when any override fails.
    pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<(), ConfigError> {
        if overrides.is_empty() {
            return Ok(());
        }

        let mut tree = serde_json::to_value(&*self)?;
        for entry in overrides {
            let (path, raw) = entry.split_once('=').ok_or_else(|| ConfigError::Override {
                entry: entry.clone(),
                reason: "expected key=value".into(),
            })?;
            let value = serde_json::from_str::<Value>(raw.trim())
                .unwrap_or_else(|_| Value::String(raw.trim().to_string()));
            set_path(&mut tree, path.trim(), value).map_err(|reason| ConfigError::Override {
                entry: entry.clone(),
                reason,
            })?;
        }

        let updated: Self = serde_json::from_value(tree).map_err(|e| ConfigError::Override {
            entry: overrides.join(", "),
            reason: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Set a dot-separated path in a JSON tree, creating intermediate objects
fn set_path(tree: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let keys: Vec<&str> = path.split('.').collect();
    if keys.iter().any(|k| k.is_empty()) {
        return Err("empty key in path".into());
    }

    // top-level sections are fixed; unknown ones would be dropped silently
    if tree.get(keys[0]).is_none() {
        return Err(format!("unknown section '{}'", keys[0]));
    }

    let mut node = tree;
    for key in &keys[..keys.len() - 1] {
        let object = node
            .as_object_mut()
            .ok_or_else(|| format!("'{}' is not a table", key))?;
        node = object
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }

    let object = node
        .as_object_mut()
        .ok_or_else(|| format!("cannot set '{}' on a non-table value", path))?;
    object.insert(keys[keys.len() - 1].to_string(), value);
    Ok(())
}
