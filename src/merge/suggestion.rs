use crate::config::SuggestionMerger;
use std::collections::HashSet;

pub const MAX_MERGED_SUGGESTIONS: usize = 3;
pub const MAX_LAYERED_SUGGESTIONS: usize = 5;

const QUICK_FIX_PREFIX: &str = "Quick fix: ";
const COMPREHENSIVE_FIX_PREFIX: &str = "Comprehensive fix: ";

const HIGH_PRIORITY_KEYWORDS: [&str; 7] = [
    "accessib",
    "screen reader",
    "security",
    "secure",
    "legal",
    "compliance",
    "privacy",
];
const CLARITY_KEYWORDS: [&str; 6] = ["clear", "clarity", "specific", "descriptive", "concise", "simple"];

/// Combine the suggestion lists of a group, one list per source violation
pub fn merge_suggestions(merger: SuggestionMerger, sources: &[&[String]]) -> Vec<String> {
    match merger {
        SuggestionMerger::CombineAndPrioritize => combine_and_prioritize(sources),
        SuggestionMerger::UseMostComprehensive => use_most_comprehensive(sources),
        SuggestionMerger::MergeSequentialFixes => merge_sequential_fixes(sources),
    }
}

/// Quick fix from the narrowest span, comprehensive fix from the widest, then the rest
pub fn layered_suggestions(shortest: &[String], longest: &[String], sources: &[&[String]]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    if let Some(quick) = shortest.first() {
        seen.insert(normalize(quick));
        merged.push(format!("{}{}", QUICK_FIX_PREFIX, quick.trim()));
    }
    if let Some(comprehensive) = longest.first() {
        seen.insert(normalize(comprehensive));
        merged.push(format!("{}{}", COMPREHENSIVE_FIX_PREFIX, comprehensive.trim()));
    }
    for suggestion in sources.iter().flat_map(|s| s.iter()) {
        if merged.len() >= MAX_LAYERED_SUGGESTIONS {
            break;
        }
        if seen.insert(normalize(suggestion)) {
            merged.push(suggestion.trim().to_string());
        }
    }
    merged.truncate(MAX_LAYERED_SUGGESTIONS);
    merged
}

fn combine_and_prioritize(sources: &[&[String]]) -> Vec<String> {
    let mut unique = unique_suggestions(sources.iter().flat_map(|s| s.iter()));
    // stable, so equal scores keep source order
    unique.sort_by_key(|s| std::cmp::Reverse(score(s)));
    unique.truncate(MAX_MERGED_SUGGESTIONS);
    unique
}

fn use_most_comprehensive(sources: &[&[String]]) -> Vec<String> {
    let mut best: Option<(&[String], usize)> = None;
    for source in sources {
        let total: usize = source.iter().map(|s| s.chars().count()).sum();
        if best.is_none_or(|(_, top)| total > top) {
            best = Some((*source, total));
        }
    }
    best.map(|(source, _)| source.to_vec()).unwrap_or_default()
}

fn merge_sequential_fixes(sources: &[&[String]]) -> Vec<String> {
    let firsts = sources.iter().filter_map(|s| s.first());
    let rest = sources.iter().flat_map(|s| s.iter().skip(1));
    let mut merged = unique_suggestions(firsts.chain(rest));
    merged.truncate(MAX_MERGED_SUGGESTIONS);
    merged
}

fn unique_suggestions<'a>(suggestions: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    suggestions
        .filter(|s| !s.trim().is_empty())
        .filter(|s| seen.insert(normalize(s)))
        .map(|s| s.trim().to_string())
        .collect()
}

fn normalize(suggestion: &str) -> String {
    suggestion
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn score(suggestion: &str) -> u32 {
    let lowered = suggestion.to_lowercase();
    let mut score = 0;
    if HIGH_PRIORITY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        score += 10;
    }
    if CLARITY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        score += 5;
    }
    match suggestion.chars().count() {
        n if n > 60 => score + 2,
        n if n > 30 => score + 1,
        _ => score,
    }
}
