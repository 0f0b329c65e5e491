//! Best-effort recovery of the text a violation refers to.
//!
//! Strategies are tried in order and the first one producing text wins.
//! When grouping, the first one producing text that can be located in the
//! sentence wins. Finding nothing is a normal outcome: such violations simply
//! do not take part in consolidation.

use crate::types::Violation;
use regex::Regex;
use std::sync::LazyLock;

/// Quoted text, with the opening quote not preceded by a word character so
/// apostrophes ("don't") are not taken as quotes
static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^\w])(?:'([^']+)'|"([^"]+)"|‘([^’]+)’|“([^”]+)”)"#)
        .expect("quoted text pattern is valid")
});

/// `<word> [is|are|was] [a|an|the] problematic|issue|error`
static PROBLEM_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([a-z][a-z'-]*)\s+(?:(?:is|are|was|seems)\s+)?(?:(?:an?|the)\s+)?(?:problematic|issue|error)\b",
    )
    .expect("problem word pattern is valid")
});

/// Where an extracted segment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSource {
    /// `text_segment`, `segment`, `problematic_text`, `matched_text` or `text_span`
    Field,
    Quoted,
    ProblemWord,
    Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub source: SegmentSource,
}

type Strategy = fn(&Violation) -> Option<String>;

const STRATEGIES: [(SegmentSource, Strategy); 4] = [
    (SegmentSource::Field, from_field as Strategy),
    (SegmentSource::Quoted, from_quotes as Strategy),
    (SegmentSource::ProblemWord, from_problem_word as Strategy),
    (SegmentSource::Position, from_position as Strategy),
];

/// Extract the implicated text of a violation
pub fn extract_segment(violation: &Violation) -> Option<Extraction> {
    STRATEGIES.iter().find_map(|(source, strategy)| {
        strategy(violation).map(|text| Extraction {
            text,
            source: *source,
        })
    })
}

/// First extraction that can be located in the sentence, with its char range
///
/// A strategy whose text is not in the sentence (a quoted replacement word,
/// say) falls through to the next one.
pub fn locate_segment(violation: &Violation) -> Option<(Extraction, (usize, usize))> {
    STRATEGIES.iter().find_map(|(source, strategy)| {
        let text = strategy(violation)?;
        let range = locate(violation, &text)?;
        Some((
            Extraction {
                text,
                source: *source,
            },
            range,
        ))
    })
}

/// Char range of `segment` inside the violation's sentence
///
/// Position fields are used when they point at the segment; otherwise the
/// first case-insensitive occurrence is taken.
pub fn locate(violation: &Violation, segment: &str) -> Option<(usize, usize)> {
    let segment = segment.trim();
    let segment_len = segment.chars().count();
    if segment_len == 0 {
        return None;
    }

    if let Some((start, end)) = violation.position_range() {
        if end - start == segment_len
            && end <= violation.sentence.chars().count()
            && eq_ignore_case(&char_slice(&violation.sentence, start, end), segment)
        {
            return Some((start, end));
        }
    }

    find_ignore_case(&violation.sentence, segment).map(|start| (start, start + segment_len))
}

/// Substring by char offsets
pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Char offset of the first case-insensitive occurrence of `needle`
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay: Vec<char> = haystack.chars().collect();
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| {
        hay[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| chars_eq_ignore_case(*a, *b))
    })
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars().count() == b.chars().count()
        && a.chars().zip(b.chars()).all(|(x, y)| chars_eq_ignore_case(x, y))
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn from_field(violation: &Violation) -> Option<String> {
    violation.explicit_segment().map(str::to_string)
}

/// First quoted text found in the sentence, else the first quoted text at all
fn from_quotes(violation: &Violation) -> Option<String> {
    let quoted: Vec<&str> = QUOTED
        .captures_iter(&violation.message)
        .filter_map(|caps| caps.iter().skip(1).flatten().next())
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect();

    quoted
        .iter()
        .find(|q| find_ignore_case(&violation.sentence, q).is_some())
        .or_else(|| quoted.first())
        .map(|q| q.to_string())
}

fn from_problem_word(violation: &Violation) -> Option<String> {
    PROBLEM_WORD
        .captures(&violation.message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn from_position(violation: &Violation) -> Option<String> {
    let (start, end) = violation.position_range()?;
    if end > violation.sentence.chars().count() {
        return None;
    }
    let text = char_slice(&violation.sentence, start, end);
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(message: &str, sentence: &str) -> Violation {
        Violation::new("rule", message, sentence, 0)
    }

    #[test]
    fn test_explicit_field_wins() {
        let v = violation("Avoid 'click'", "Click on the button.").with_segment("the button");
        let extraction = extract_segment(&v).unwrap();
        assert_eq!(extraction.text, "the button");
        assert_eq!(extraction.source, SegmentSource::Field);
    }

    #[test]
    fn test_single_quoted_text() {
        let v = violation("Avoid the phrase 'click on'.", "Please click on the link.");
        let extraction = extract_segment(&v).unwrap();
        assert_eq!(extraction.text, "click on");
        assert_eq!(extraction.source, SegmentSource::Quoted);
    }

    #[test]
    fn test_apostrophe_is_not_a_quote() {
        let v = violation("Don't use 'utilize' here", "We utilize tools.");
        assert_eq!(extract_segment(&v).unwrap().text, "utilize");
    }

    #[test]
    fn test_quoted_prefers_text_in_sentence() {
        let v = violation(
            r#"Replace "leverage" with "use""#,
            "Teams leverage the dashboard.",
        );
        assert_eq!(extract_segment(&v).unwrap().text, "leverage");

        let v = violation(r#"Prefer "use" over "leverage""#, "Teams leverage it.");
        assert_eq!(extract_segment(&v).unwrap().text, "leverage");
    }

    #[test]
    fn test_typographic_quotes() {
        let v = violation("The word “simply” is condescending", "Simply restart it.");
        assert_eq!(extract_segment(&v).unwrap().text, "simply");
    }

    #[test]
    fn test_problem_word_pattern() {
        let v = violation("Utilize is problematic in plain writing", "We utilize tools.");
        let extraction = extract_segment(&v).unwrap();
        assert_eq!(extraction.text, "Utilize");
        assert_eq!(extraction.source, SegmentSource::ProblemWord);
    }

    #[test]
    fn test_position_fallback() {
        let v = violation("Sentence is too long", "Click on the button now.").with_positions(9, 19);
        let extraction = extract_segment(&v);
        // "Sentence is" does not match the pattern, so positions are used
        assert_eq!(
            extraction,
            Some(Extraction {
                text: "the button".into(),
                source: SegmentSource::Position,
            })
        );
    }

    #[test]
    fn test_unlocatable_quote_falls_through_to_positions() {
        let v = violation("Use 'select' instead", "Now click on the button.").with_positions(4, 12);
        assert_eq!(extract_segment(&v).unwrap().source, SegmentSource::Quoted);
        let (extraction, range) = locate_segment(&v).unwrap();
        assert_eq!(extraction.text, "click on");
        assert_eq!(extraction.source, SegmentSource::Position);
        assert_eq!(range, (4, 12));

        let v = violation("Use 'select' instead", "Now click on the button.");
        assert_eq!(locate_segment(&v), None);
    }

    #[test]
    fn test_nothing_to_extract() {
        let v = violation("Consider rewording for tone", "We are thrilled.");
        assert_eq!(extract_segment(&v), None);
    }

    #[test]
    fn test_locate_case_insensitive() {
        let v = violation("", "Please Click on the link.");
        assert_eq!(locate(&v, "click on"), Some((7, 15)));
        assert_eq!(locate(&v, "missing"), None);
        assert_eq!(locate(&v, "  "), None);
    }

    #[test]
    fn test_locate_prefers_matching_positions() {
        let v = violation("", "the cat saw the dog").with_positions(12, 15);
        assert_eq!(locate(&v, "the"), Some((12, 15)));

        let v = violation("", "the cat saw the dog").with_positions(4, 7);
        assert_eq!(locate(&v, "the"), Some((0, 3)));
    }

    #[test]
    fn test_locate_counts_chars_not_bytes() {
        let v = violation("", "Café crème is served");
        assert_eq!(locate(&v, "crème"), Some((5, 10)));
        assert_eq!(char_slice(&v.sentence, 5, 10), "crème");
    }
}
