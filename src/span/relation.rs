use super::TextSpan;
use crate::types::ConsolidationType;

/// Minimum overlap, as a share of the longer span, for two spans to count as overlapping
pub const OVERLAP_RATIO_THRESHOLD: f64 = 0.3;

/// Maximum number of characters between two spans for them to count as adjacent
pub const ADJACENT_MAX_GAP: usize = 5;

const INTERACTIVE_VERBS: [&str; 5] = ["click", "select", "choose", "press", "tap"];

// Checked in order, one suffix at most
const STEM_SUFFIXES: [&str; 4] = ["ing", "ed", "ly", "s"];

const MIN_STEM_LEN: usize = 3;

/// Classify how two spans of the same sentence relate
///
/// Checks run in order (overlap, nested, adjacent, semantic) and the first
/// match wins. Returns `None` for unrelated spans.
pub fn classify(a: &TextSpan, b: &TextSpan) -> Option<ConsolidationType> {
    if (a.start == b.start && a.end == b.end) || overlap_ratio(a, b) >= OVERLAP_RATIO_THRESHOLD {
        Some(ConsolidationType::Overlap)
    } else if a.contains(b) || b.contains(a) {
        Some(ConsolidationType::Nested)
    } else if gap(a, b) <= ADJACENT_MAX_GAP {
        Some(ConsolidationType::Adjacent)
    } else if is_semantic(&a.text, &b.text) {
        Some(ConsolidationType::Semantic)
    } else {
        None
    }
}

/// Shared length divided by the longer span's length
pub fn overlap_ratio(a: &TextSpan, b: &TextSpan) -> f64 {
    let longer = a.len().max(b.len());
    if longer == 0 {
        return 0.0;
    }
    let shared = a.end.min(b.end).saturating_sub(a.start.max(b.start));
    shared as f64 / longer as f64
}

/// Characters between two spans; zero when they touch or overlap
pub fn gap(a: &TextSpan, b: &TextSpan) -> usize {
    if a.end <= b.start {
        b.start - a.end
    } else if b.end <= a.start {
        a.start - b.end
    } else {
        0
    }
}

/// Word-level similarity between two span texts
pub fn is_semantic(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }

    a.contains(&b)
        || b.contains(&a)
        || stem(&a) == stem(&b)
        || (INTERACTIVE_VERBS.contains(&a.as_str()) && INTERACTIVE_VERBS.contains(&b.as_str()))
}

fn stem(word: &str) -> &str {
    STEM_SUFFIXES
        .iter()
        .find_map(|suffix| {
            word.strip_suffix(suffix)
                .filter(|base| base.chars().count() >= MIN_STEM_LEN)
        })
        .unwrap_or(word)
}
