//! Turns one span group into a single consolidated violation.

pub mod fix;
pub mod message;
pub mod suggestion;

use crate::error::MergeError;
use crate::priority::{PriorityManager, Strategy};
use crate::span::SpanGroup;
use crate::types::{ConsolidationType, FixOption, Severity, Violation};
use message::{Placeholders, issue_labels, issue_text, render};
use serde_json::{Map, Value};
use suggestion::{layered_suggestions, merge_suggestions};
use tracing::trace;

/// Result of merging one span group
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedViolation {
    pub rule_type: String,
    pub message: String,
    pub suggestions: Vec<String>,
    pub severity: Severity,
    pub sentence: String,
    pub sentence_index: usize,
    /// Rule ids of the source violations, in group order
    pub consolidated_from: Vec<String>,
    pub consolidation_type: ConsolidationType,
    /// Dominant span text
    pub text_span: String,
    /// Char range of the dominant span
    pub position: (usize, usize),
    /// Only for nested groups of two or more spans
    pub fix_options: Option<Vec<FixOption>>,
    /// Free-form fields of the primary violation
    pub metadata: Map<String, Value>,
}

impl ConsolidatedViolation {
    pub fn into_violation(self) -> Violation {
        let mut violation = Violation::new(
            self.rule_type,
            self.message,
            self.sentence,
            self.sentence_index,
        )
        .with_positions(self.position.0, self.position.1)
        .with_severity(self.severity)
        .with_suggestions(self.suggestions);
        violation.consolidated_from = Some(self.consolidated_from);
        violation.consolidation_type = Some(self.consolidation_type);
        violation.text_span = Some(self.text_span);
        violation.fix_options = self.fix_options;
        violation.metadata = self.metadata;
        violation
    }
}

/// Composes consolidated messages, suggestions and severities
#[derive(Debug, Clone, Copy)]
pub struct MessageMerger<'a> {
    priorities: PriorityManager<'a>,
}

impl<'a> MessageMerger<'a> {
    pub fn new(priorities: PriorityManager<'a>) -> Self {
        Self { priorities }
    }

    pub fn merge(
        &self,
        group: &SpanGroup,
        primary_rule: &str,
        strategy: &Strategy,
    ) -> Result<ConsolidatedViolation, MergeError> {
        let dominant = group.dominant_member().ok_or(MergeError::EmptyGroup)?;
        let primary = group
            .members
            .iter()
            .find(|m| m.violation.rule_type == primary_rule)
            .ok_or_else(|| MergeError::PrimaryRuleMissing(primary_rule.to_string()))?;
        // both exist whenever the group is non-empty
        let shortest = group.shortest().ok_or(MergeError::EmptyGroup)?;
        let longest = group.longest().ok_or(MergeError::EmptyGroup)?;

        let pattern = self.priorities.message_pattern(group.consolidation_type);
        let template = strategy
            .message_template
            .as_deref()
            .unwrap_or(&pattern.template);

        // primary source first, the rest in group order
        let sources: Vec<&Violation> = std::iter::once(&primary.violation)
            .chain(
                group
                    .members
                    .iter()
                    .filter(|m| !std::ptr::eq(*m, primary))
                    .map(|m| &m.violation),
            )
            .collect();

        let placeholders = Placeholders {
            text_span: dominant.span.text.clone(),
            outer_span: longest.span.text.clone(),
            primary_issue: issue_text(&primary.violation.message),
            comprehensive_issue: issue_text(&longest.violation.message),
            combined_issue: issue_labels(sources.iter().map(|v| v.message.as_str())).join(", "),
            rule_types: unique_rule_types(group).join(", "),
        };
        let message = render(template, &placeholders);

        let suggestion_lists: Vec<&[String]> =
            sources.iter().map(|v| v.suggestions.as_slice()).collect();
        let layered = group.consolidation_type == ConsolidationType::Nested && group.len() > 1;
        let suggestions = if layered {
            layered_suggestions(
                &shortest.violation.suggestions,
                &longest.violation.suggestions,
                &suggestion_lists,
            )
        } else {
            let merger = strategy
                .suggestion_merger
                .unwrap_or(pattern.suggestion_merger);
            merge_suggestions(merger, &suggestion_lists)
        };

        let severities: Vec<Severity> = group.members.iter().map(|m| m.violation.severity).collect();
        let severity = self.priorities.escalate_severity(&severities);

        trace!(
            "Merged [{}] in sentence {} as {} via '{}'",
            placeholders.rule_types, group.sentence_index, group.consolidation_type, strategy.strategy
        );

        Ok(ConsolidatedViolation {
            rule_type: primary.violation.rule_type.clone(),
            message,
            suggestions,
            severity,
            sentence: primary.violation.sentence.clone(),
            sentence_index: group.sentence_index,
            consolidated_from: group.rule_ids(),
            consolidation_type: group.consolidation_type,
            text_span: dominant.span.text.clone(),
            position: (dominant.span.start, dominant.span.end),
            fix_options: layered.then(|| fix::fix_options(group)),
            metadata: primary.violation.metadata.clone(),
        })
    }
}

fn unique_rule_types(group: &SpanGroup) -> Vec<&str> {
    let mut rules: Vec<&str> = Vec::new();
    for member in &group.members {
        if !rules.contains(&member.violation.rule_type.as_str()) {
            rules.push(&member.violation.rule_type);
        }
    }
    rules
}
