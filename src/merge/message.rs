//! Consolidated message phrasing.

/// Labels kept per consolidated message
pub const MAX_ISSUE_LABELS: usize = 3;

const FALLBACK_WORDS: usize = 3;

// Checked in order, first hit wins
const ISSUE_KEYWORDS: [(&str, &[&str]); 5] = [
    ("accessibility", &["accessib", "screen reader", "alt text", "a11y"]),
    ("link text", &["link text", "click here", "hyperlink", "link"]),
    ("grammar", &["grammar", "grammatical", "passive voice", "agreement", "tense"]),
    ("anthropomorphism", &["anthropomorph", "human qualities", "human traits"]),
    ("interaction", &["click", "mouse", "button", "tap", "press"]),
];

/// Values substituted into `{placeholder}` markers of a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    /// Dominant span text
    pub text_span: String,
    /// Longest span text
    pub outer_span: String,
    pub primary_issue: String,
    /// Message of the longest span's violation
    pub comprehensive_issue: String,
    /// Issue labels joined with ", "
    pub combined_issue: String,
    /// Distinct rule ids joined with ", "
    pub rule_types: String,
}

impl Placeholders {
    fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("{text_span}", self.text_span.as_str()),
            ("{outer_span}", self.outer_span.as_str()),
            ("{primary_issue}", self.primary_issue.as_str()),
            ("{comprehensive_issue}", self.comprehensive_issue.as_str()),
            ("{combined_issue}", self.combined_issue.as_str()),
            ("{rule_types}", self.rule_types.as_str()),
        ]
    }
}

/// Substitute known placeholders; unknown ones are left as written
pub fn render(template: &str, placeholders: &Placeholders) -> String {
    placeholders
        .pairs()
        .into_iter()
        .fold(template.to_string(), |message, (marker, value)| {
            message.replace(marker, value)
        })
}

/// Message without surrounding whitespace and trailing full stop
pub fn issue_text(message: &str) -> String {
    message.trim().trim_end_matches('.').trim_end().to_string()
}

/// Short labels for the given messages, de-duplicated in order
pub fn issue_labels<'a>(messages: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in messages.into_iter().filter_map(issue_label) {
        if labels.len() == MAX_ISSUE_LABELS {
            break;
        }
        if !labels.iter().any(|l| l.eq_ignore_ascii_case(&label)) {
            labels.push(label);
        }
    }
    labels
}

fn issue_label(message: &str) -> Option<String> {
    let message = issue_text(message);
    if message.is_empty() {
        return None;
    }

    let lowered = message.to_lowercase();
    if let Some((label, _)) = ISSUE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
    {
        return Some(label.to_string());
    }

    if let Some((head, _)) = message.split_once(':') {
        let head = head.trim();
        if !head.is_empty() {
            return Some(head.to_string());
        }
    }

    Some(
        message
            .split_whitespace()
            .take(FALLBACK_WORDS)
            .collect::<Vec<_>>()
            .join(" "),
    )
}
