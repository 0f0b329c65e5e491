use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Severity of a violation, ordered `low < medium < high`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship between the spans of a consolidated group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConsolidationType {
    Overlap,
    Nested,
    Adjacent,
    Semantic,
    Related,
    Single,
}

impl ConsolidationType {
    pub const ALL: [ConsolidationType; 6] = [
        Self::Overlap,
        Self::Nested,
        Self::Adjacent,
        Self::Semantic,
        Self::Related,
        Self::Single,
    ];

    /// Rank used to pick a group's type: `nested > overlap > adjacent > semantic > related`
    pub fn precedence(self) -> u8 {
        match self {
            Self::Nested => 5,
            Self::Overlap => 4,
            Self::Adjacent => 3,
            Self::Semantic => 2,
            Self::Related => 1,
            Self::Single => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overlap => "overlap",
            Self::Nested => "nested",
            Self::Adjacent => "adjacent",
            Self::Semantic => "semantic",
            Self::Related => "related",
            Self::Single => "single",
        }
    }
}

impl fmt::Display for ConsolidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsolidationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown consolidation type '{}'", s))
    }
}

/// Tag of a fix option, from the narrowest to the widest rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FixKind {
    Quick,
    Intermediate,
    Comprehensive,
}

impl FixKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Intermediate => "intermediate",
            Self::Comprehensive => "comprehensive",
        }
    }
}

/// How much of the sentence a fix option rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FixScope {
    Word,
    Phrase,
    Clause,
    Sentence,
}

/// One scoped alternative offered for a nested group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FixOption {
    #[serde(rename = "type")]
    pub kind: FixKind,
    /// Text the fix applies to
    pub text_span: String,
    pub description: String,
    /// At most two suggestions taken from the span's own violation
    pub suggestions: Vec<String>,
    pub scope: FixScope,
}

/// A style-check violation as produced by a rule checker
///
/// Consolidated records reuse the same shape and additionally carry
/// `consolidated_from`, `consolidation_type`, `text_span` and, for nested
/// groups, `fix_options`. Any field not listed here is kept in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    /// Identifier of the rule that reported the violation
    pub rule_type: String,
    /// Human-readable message
    pub message: String,
    /// Ordered fix suggestions
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    /// Text of the sentence the violation belongs to
    #[serde(default)]
    pub sentence: String,
    #[serde(default)]
    pub sentence_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problematic_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    /// Character offset of the segment inside the sentence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_position: Option<usize>,
    /// Rule ids folded into this record, one per source violation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidated_from: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidation_type: Option<ConsolidationType>,
    /// Text of the dominant span of a consolidated record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_span: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_options: Option<Vec<FixOption>>,
    /// Free-form fields preserved as-is
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Violation {
    pub fn new(
        rule_type: impl Into<String>,
        message: impl Into<String>,
        sentence: impl Into<String>,
        sentence_index: usize,
    ) -> Self {
        Self {
            rule_type: rule_type.into(),
            message: message.into(),
            suggestions: Vec::new(),
            severity: Severity::default(),
            sentence: sentence.into(),
            sentence_index,
            text_segment: None,
            segment: None,
            problematic_text: None,
            matched_text: None,
            start_position: None,
            end_position: None,
            consolidated_from: None,
            consolidation_type: None,
            text_span: None,
            fix_options: None,
            metadata: Map::new(),
        }
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.text_segment = Some(segment.into());
        self
    }

    pub fn with_positions(mut self, start: usize, end: usize) -> Self {
        self.start_position = Some(start);
        self.end_position = Some(end);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    /// First non-blank explicit segment field, in order of preference
    pub fn explicit_segment(&self) -> Option<&str> {
        [
            &self.text_segment,
            &self.segment,
            &self.problematic_text,
            &self.matched_text,
            &self.text_span,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
    }

    /// Position fields as a non-empty `start..end` range, if both are set
    pub fn position_range(&self) -> Option<(usize, usize)> {
        match (self.start_position, self.end_position) {
            (Some(start), Some(end)) if start < end => Some((start, end)),
            _ => None,
        }
    }
}
