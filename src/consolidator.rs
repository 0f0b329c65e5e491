use crate::config::PriorityConfig;
use crate::error::MergeError;
use crate::merge::{ConsolidatedViolation, MessageMerger};
use crate::priority::{PriorityManager, Strategy};
use crate::span::{SpanAnalyzer, SpanGroup};
use crate::types::Violation;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Counters of one consolidation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationStats {
    pub input: usize,
    pub output: usize,
    /// Span groups found
    pub groups: usize,
    /// Source violations folded into consolidated records
    pub consolidated: usize,
    /// Groups whose merge failed and were passed through
    pub failed_groups: usize,
    /// Violations whose text could not be located
    pub unlocated: usize,
}

/// Merges related violations of each sentence into single records
#[derive(Debug, Clone, Copy)]
pub struct Consolidator<'a> {
    analyzer: SpanAnalyzer,
    priorities: PriorityManager<'a>,
}

impl<'a> Consolidator<'a> {
    pub fn new(config: &'a PriorityConfig) -> Self {
        Self {
            analyzer: SpanAnalyzer::new(config.grouping),
            priorities: PriorityManager::new(config),
        }
    }

    pub fn consolidate(&self, violations: Vec<Violation>) -> Vec<Violation> {
        self.consolidate_with_stats(violations).0
    }

    /// Output is ordered by first appearance of each sentence index, then by
    /// input order; a consolidated record takes the place of its first member
    pub fn consolidate_with_stats(&self, violations: Vec<Violation>) -> (Vec<Violation>, ConsolidationStats) {
        let mut stats = ConsolidationStats {
            input: violations.len(),
            ..Default::default()
        };

        let mut output = Vec::with_capacity(violations.len());
        for block in sentence_blocks(violations) {
            self.consolidate_sentence(block, &mut output, &mut stats);
        }

        stats.output = output.len();
        debug!(
            "Consolidated {} violations into {} ({} groups, {} failed, {} unlocated)",
            stats.input, stats.output, stats.groups, stats.failed_groups, stats.unlocated
        );
        (output, stats)
    }

    fn consolidate_sentence(
        &self,
        block: Vec<Violation>,
        output: &mut Vec<Violation>,
        stats: &mut ConsolidationStats,
    ) {
        let merger = MessageMerger::new(self.priorities);
        self.consolidate_sentence_with(block, output, stats, |group, strategy| {
            merger.merge(group, &strategy.primary_rule, strategy)
        });
    }

    /// Group one sentence's violations and fold each group with `merge`
    ///
    /// A group whose merge fails keeps its original violations.
    fn consolidate_sentence_with<F>(
        &self,
        block: Vec<Violation>,
        output: &mut Vec<Violation>,
        stats: &mut ConsolidationStats,
        merge: F,
    ) where
        F: Fn(&SpanGroup, &Strategy) -> Result<ConsolidatedViolation, MergeError>,
    {
        let spans = self.analyzer.extract_spans(&block);
        stats.unlocated += block.len() - spans.len();
        let groups = self.analyzer.group_spans(spans, &block);
        stats.groups += groups.len();

        // first member index -> consolidated record
        let mut replacements: HashMap<usize, Violation> = HashMap::new();
        let mut folded = vec![false; block.len()];

        for group in &groups {
            let rule_ids = group.rule_ids();
            let strategy = self.priorities.consolidation_strategy(&rule_ids);
            let indices = group.violation_indices();

            match merge(group, &strategy) {
                Ok(consolidated) => {
                    let Some(&first) = indices.iter().min() else {
                        continue;
                    };
                    for &i in &indices {
                        folded[i] = true;
                    }
                    stats.consolidated += indices.len();
                    replacements.insert(first, consolidated.into_violation());
                }
                Err(e) => {
                    warn!(
                        "Failed to merge [{}] in sentence {}, keeping originals: {}",
                        rule_ids.join(", "),
                        group.sentence_index,
                        e
                    );
                    stats.failed_groups += 1;
                }
            }
        }

        for (i, violation) in block.into_iter().enumerate() {
            if let Some(consolidated) = replacements.remove(&i) {
                output.push(consolidated);
            } else if !folded[i] {
                output.push(violation);
            }
        }
    }
}

/// Consolidate with `config`, or the built-in configuration when `None`
pub fn consolidate(violations: Vec<Violation>, config: Option<&PriorityConfig>) -> Vec<Violation> {
    consolidate_with_stats(violations, config).0
}

pub fn consolidate_with_stats(
    violations: Vec<Violation>,
    config: Option<&PriorityConfig>,
) -> (Vec<Violation>, ConsolidationStats) {
    match config {
        Some(config) => Consolidator::new(config).consolidate_with_stats(violations),
        None => {
            let builtin = PriorityConfig::builtin();
            Consolidator::new(&builtin).consolidate_with_stats(violations)
        }
    }
}

/// Split into per-sentence blocks, ordered by first appearance
fn sentence_blocks(violations: Vec<Violation>) -> Vec<Vec<Violation>> {
    let mut blocks: Vec<Vec<Violation>> = Vec::new();
    let mut slots: HashMap<usize, usize> = HashMap::new();
    for violation in violations {
        let slot = *slots.entry(violation.sentence_index).or_insert_with(|| {
            blocks.push(Vec::new());
            blocks.len() - 1
        });
        blocks[slot].push(violation);
    }
    blocks
}
