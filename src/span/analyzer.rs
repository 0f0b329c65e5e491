use super::extract::{char_slice, locate_segment};
use super::relation::classify;
use super::{GroupMember, SpanGroup, TextSpan};
use crate::config::GroupingMode;
use crate::types::{ConsolidationType, Violation};
use std::collections::HashMap;
use tracing::{debug, trace};

/// The longest span anchors a group only if it is at least this many times
/// longer than some other member
pub const DOMINANCE_RATIO: f64 = 1.5;

/// Turns violations into groups of related spans, one sentence at a time
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanAnalyzer {
    mode: GroupingMode,
}

impl SpanAnalyzer {
    pub fn new(mode: GroupingMode) -> Self {
        Self { mode }
    }

    /// Groups of two or more related spans
    ///
    /// Violations whose text cannot be located in their sentence are left out.
    pub fn analyze(&self, violations: &[Violation]) -> Vec<SpanGroup> {
        let spans = self.extract_spans(violations);
        self.group_spans(spans, violations)
    }

    /// Locate the span of every violation that has one
    pub fn extract_spans(&self, violations: &[Violation]) -> Vec<TextSpan> {
        violations
            .iter()
            .enumerate()
            .filter_map(|(i, violation)| {
                let Some((extraction, (start, end))) = locate_segment(violation) else {
                    debug!(
                        "No locatable text segment for '{}' in sentence {}, passing through",
                        violation.rule_type, violation.sentence_index
                    );
                    return None;
                };
                trace!(
                    "Span [{}, {}) for '{}' from {:?}",
                    start, end, violation.rule_type, extraction.source
                );
                Some(TextSpan {
                    text: char_slice(&violation.sentence, start, end),
                    start,
                    end,
                    sentence_index: violation.sentence_index,
                    violation: i,
                })
            })
            .collect()
    }

    /// Cluster spans per sentence; `violations` is the slice the spans index into
    pub fn group_spans(&self, spans: Vec<TextSpan>, violations: &[Violation]) -> Vec<SpanGroup> {
        partition_by_sentence(spans)
            .into_iter()
            .flat_map(|(sentence_index, spans)| {
                let clusters = match self.mode {
                    GroupingMode::Greedy => cluster_greedy(&spans),
                    GroupingMode::Transitive => cluster_transitive(&spans),
                };
                trace!(
                    "Sentence {}: {} spans in {} clusters",
                    sentence_index,
                    spans.len(),
                    clusters.len()
                );
                clusters
                    .into_iter()
                    .filter(|cluster| cluster.len() > 1)
                    .map(|cluster| build_group(sentence_index, &spans, &cluster, violations))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Split spans by sentence index, keeping first-appearance order
fn partition_by_sentence(spans: Vec<TextSpan>) -> Vec<(usize, Vec<TextSpan>)> {
    let mut order: Vec<(usize, Vec<TextSpan>)> = Vec::new();
    let mut positions: HashMap<usize, usize> = HashMap::new();
    for span in spans {
        let slot = *positions.entry(span.sentence_index).or_insert_with(|| {
            order.push((span.sentence_index, Vec::new()));
            order.len() - 1
        });
        order[slot].1.push(span);
    }
    order
}

/// One pass: each unconsumed span anchors a cluster, and each later
/// unconsumed span joins it when related to any member gathered so far
fn cluster_greedy(spans: &[TextSpan]) -> Vec<Vec<usize>> {
    let mut consumed = vec![false; spans.len()];
    let mut clusters = Vec::new();

    for anchor in 0..spans.len() {
        if consumed[anchor] {
            continue;
        }
        consumed[anchor] = true;
        let mut members = vec![anchor];

        for candidate in anchor + 1..spans.len() {
            if consumed[candidate] {
                continue;
            }
            let related = members
                .iter()
                .any(|&m| classify(&spans[m], &spans[candidate]).is_some());
            if related {
                members.push(candidate);
                consumed[candidate] = true;
            }
        }
        clusters.push(members);
    }
    clusters
}

/// Connected components over every related pair
fn cluster_transitive(spans: &[TextSpan]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..spans.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for a in 0..spans.len() {
        for b in a + 1..spans.len() {
            if classify(&spans[a], &spans[b]).is_some() {
                let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
                if ra != rb {
                    parent[ra.max(rb)] = ra.min(rb);
                }
            }
        }
    }

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut by_root: HashMap<usize, usize> = HashMap::new();
    for i in 0..spans.len() {
        let root = find(&mut parent, i);
        let slot = *by_root.entry(root).or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[slot].push(i);
    }
    clusters
}

fn build_group(
    sentence_index: usize,
    spans: &[TextSpan],
    cluster: &[usize],
    violations: &[Violation],
) -> SpanGroup {
    let members: Vec<GroupMember> = cluster
        .iter()
        .map(|&i| GroupMember {
            span: spans[i].clone(),
            violation: violations[spans[i].violation].clone(),
        })
        .collect();
    let member_spans: Vec<&TextSpan> = members.iter().map(|m| &m.span).collect();

    SpanGroup {
        dominant: select_dominant(&member_spans),
        consolidation_type: group_type(&member_spans),
        sentence_index,
        members,
    }
}

/// Highest-precedence relationship over all member pairs
fn group_type(spans: &[&TextSpan]) -> ConsolidationType {
    if spans.len() < 2 {
        return ConsolidationType::Single;
    }
    let mut best = ConsolidationType::Related;
    for (i, a) in spans.iter().enumerate() {
        for b in &spans[i + 1..] {
            if let Some(relation) = classify(a, b) {
                if relation.precedence() > best.precedence() {
                    best = relation;
                }
            }
        }
    }
    best
}

/// Longest span when it clearly dominates by length, else the leftmost one
fn select_dominant(spans: &[&TextSpan]) -> usize {
    let Some((longest, longest_span)) = spans
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, s)| s.len())
        .map(|(i, s)| (i, *s))
    else {
        return 0;
    };

    let dominates = spans.iter().enumerate().any(|(i, s)| {
        i != longest && longest_span.len() as f64 >= DOMINANCE_RATIO * s.len() as f64
    });
    if dominates {
        return longest;
    }

    spans
        .iter()
        .enumerate()
        .min_by_key(|(i, s)| (s.start, *i))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE: &str = "Users click on the button to save their work.";

    fn violation(rule: &str, segment: &str, sentence_index: usize) -> Violation {
        Violation::new(rule, format!("Issue with '{}'", segment), SENTENCE, sentence_index)
            .with_segment(segment)
    }

    fn span(text: &str, start: usize, end: usize) -> TextSpan {
        TextSpan {
            text: text.into(),
            start,
            end,
            sentence_index: 0,
            violation: 0,
        }
    }

    #[test]
    fn test_nested_group_with_dominant_outer_span() {
        let violations = vec![
            violation("mouse_buttons", "click on the button", 0),
            violation("word_usage", "the", 0),
        ];
        let groups = SpanAnalyzer::default().analyze(&violations);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.consolidation_type, ConsolidationType::Nested);
        let dominant = group.dominant_member().unwrap();
        assert_eq!(dominant.span.text, "click on the button");
        assert_eq!((dominant.span.start, dominant.span.end), (6, 25));
        assert_eq!(group.violation_indices(), vec![0, 1]);
    }

    #[test]
    fn test_unlocated_violations_are_skipped() {
        let violations = vec![
            violation("a", "click", 0),
            Violation::new("b", "Tone is too informal", SENTENCE, 0),
            violation("c", "not in sentence", 0),
        ];
        let spans = SpanAnalyzer::default().extract_spans(&violations);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].violation, 0);
        assert!(SpanAnalyzer::default().analyze(&violations).is_empty());
    }

    #[test]
    fn test_groups_never_cross_sentences() {
        let violations = vec![violation("a", "click", 0), violation("b", "click", 1)];
        assert!(SpanAnalyzer::default().analyze(&violations).is_empty());
    }

    #[test]
    fn test_single_spans_are_not_emitted() {
        let violations = vec![violation("a", "Users", 0), violation("b", "their work", 0)];
        assert!(SpanAnalyzer::default().analyze(&violations).is_empty());
    }

    #[test]
    fn test_greedy_is_not_transitive() {
        let spans = vec![
            span("alpha", 0, 4),
            span("bravo", 30, 34),
            span("delta", 7, 11),
        ];
        assert_eq!(cluster_greedy(&spans), vec![vec![0, 2], vec![1]]);

        // chained through the middle span, which is checked first
        let spans = vec![
            span("alpha", 0, 4),
            span("delta", 7, 11),
            span("gamma", 14, 18),
        ];
        assert_eq!(cluster_greedy(&spans), vec![vec![0, 1, 2]]);

        // the far span is checked before the linking span joins
        let spans = vec![
            span("alpha", 0, 4),
            span("gamma", 14, 18),
            span("delta", 7, 11),
        ];
        assert_eq!(cluster_greedy(&spans), vec![vec![0, 2], vec![1]]);

        let spans = vec![
            span("alpha", 0, 4),
            span("omega", 20, 24),
            span("delta", 7, 11),
            span("gamma", 14, 18),
        ];
        assert_eq!(cluster_greedy(&spans), vec![vec![0, 2, 3], vec![1]]);
    }

    #[test]
    fn test_transitive_joins_chains() {
        let spans = vec![
            span("alpha", 0, 4),
            span("gamma", 14, 18),
            span("kappa", 30, 34),
            span("delta", 7, 11),
        ];
        assert_eq!(cluster_greedy(&spans), vec![vec![0, 3], vec![1], vec![2]]);
        assert_eq!(cluster_transitive(&spans), vec![vec![0, 1, 3], vec![2]]);

        let late_link = vec![
            span("alpha", 0, 4),
            span("omega", 20, 24),
            span("kappa", 40, 44),
            span("gamma", 14, 18),
            span("delta", 7, 11),
        ];
        assert_eq!(
            cluster_greedy(&late_link),
            vec![vec![0, 4], vec![1, 3], vec![2]]
        );
        assert_eq!(
            cluster_transitive(&late_link),
            vec![vec![0, 1, 3, 4], vec![2]]
        );
    }

    #[test]
    fn test_group_type_takes_highest_precedence() {
        let outer = span("alpha bravo delta gamma", 0, 20);
        let inner = span("bravo", 5, 9);
        let next = span("kappa", 22, 26);
        assert_eq!(group_type(&[&outer, &next]), ConsolidationType::Adjacent);
        assert_eq!(
            group_type(&[&outer, &next, &inner]),
            ConsolidationType::Nested
        );
        assert_eq!(group_type(&[&outer]), ConsolidationType::Single);
    }

    #[test]
    fn test_dominant_prefers_clearly_longer_span() {
        let long = span("alpha bravo delta gamma", 10, 30);
        let short = span("kappa", 2, 6);
        assert_eq!(select_dominant(&[&short, &long]), 1);
    }

    #[test]
    fn test_dominant_falls_back_to_leftmost() {
        let a = span("alpha bravo", 10, 20);
        let b = span("delta gam", 4, 12);
        // 10 < 1.5 * 8, no clear winner
        assert_eq!(select_dominant(&[&a, &b]), 1);

        let same_a = span("alpha bravo", 10, 20);
        let same_b = span("alpha bravo", 10, 20);
        assert_eq!(select_dominant(&[&same_a, &same_b]), 0);
    }
}
