//! Span analysis: locate the text each violation points at and cluster
//! related spans of the same sentence.

mod analyzer;
pub mod extract;
pub mod relation;

pub use analyzer::{DOMINANCE_RATIO, SpanAnalyzer};

use crate::types::{ConsolidationType, Violation};

/// Text implicated by one violation, in char offsets relative to its sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub start: usize,
    /// Exclusive
    pub end: usize,
    pub sentence_index: usize,
    /// Index of the source violation in the analysed slice
    pub violation: usize,
}

impl TextSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span
    pub fn contains(&self, other: &TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A span together with the violation it came from
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub span: TextSpan,
    pub violation: Violation,
}

/// Related spans of one sentence scheduled for consolidation
#[derive(Debug, Clone, PartialEq)]
pub struct SpanGroup {
    /// Members in analysis order
    pub members: Vec<GroupMember>,
    /// Index into `members` of the span anchoring the consolidated message
    pub dominant: usize,
    pub consolidation_type: ConsolidationType,
    pub sentence_index: usize,
}

impl SpanGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn dominant_member(&self) -> Option<&GroupMember> {
        self.members.get(self.dominant)
    }

    /// Shortest member span, first one on ties
    pub fn shortest(&self) -> Option<&GroupMember> {
        self.members.iter().min_by_key(|m| m.span.len())
    }

    /// Longest member span, last one on ties
    pub fn longest(&self) -> Option<&GroupMember> {
        self.members.iter().max_by_key(|m| m.span.len())
    }

    /// Rule ids of the members, one per source violation
    pub fn rule_ids(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| m.violation.rule_type.clone())
            .collect()
    }

    /// Indices of the source violations in the analysed slice
    pub fn violation_indices(&self) -> Vec<usize> {
        self.members.iter().map(|m| m.span.violation).collect()
    }
}
