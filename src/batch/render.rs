use super::worker::DocumentResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use spanmerge::{ConsolidationStats, Violation};

const ELAPSED_TIME_PRECISION: usize = 2;

/// JSON report written by `--output *.json`
#[derive(Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub documents: Vec<DocumentReport<'a>>,
}

#[derive(Serialize)]
pub struct DocumentReport<'a> {
    pub source: &'a str,
    pub violations: &'a [Violation],
    pub stats: ConsolidationStats,
    pub elapsed_secs: f64,
}

impl<'a> Report<'a> {
    pub fn new(documents: &'a [DocumentResult], generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            documents: documents
                .iter()
                .map(|doc| DocumentReport {
                    source: &doc.source,
                    violations: &doc.violations,
                    stats: doc.stats,
                    elapsed_secs: doc.elapsed_secs,
                })
                .collect(),
        }
    }
}

/// Markdown listing per document and sentence
pub fn format_violations(documents: &[DocumentResult]) -> String {
    if documents.iter().all(|doc| doc.violations.is_empty()) {
        return "No violations found".to_string();
    }

    let mut output = String::new();
    for doc in documents.iter().filter(|doc| !doc.violations.is_empty()) {
        output.push_str(&format!("# Violations in {}\n\n", doc.source));
        output.push_str(&format!(
            "{} reported, {} after consolidation ({} groups, {:.prec$}s)\n\n",
            doc.stats.input,
            doc.stats.output,
            doc.stats.groups,
            doc.elapsed_secs,
            prec = ELAPSED_TIME_PRECISION
        ));

        let mut current_sentence = None;
        for violation in &doc.violations {
            if current_sentence != Some(violation.sentence_index) {
                if current_sentence.is_some() {
                    output.push('\n');
                }
                current_sentence = Some(violation.sentence_index);
                output.push_str(&format!("## Sentence {}\n\n", violation.sentence_index));
                let sentence = violation.sentence.trim();
                if !sentence.is_empty() {
                    output.push_str(&format!("> {}\n\n", sentence));
                }
            }
            format_violation(&mut output, violation);
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}

fn format_violation(output: &mut String, violation: &Violation) {
    output.push_str(&format!(
        "- **{}** ({}): {}\n",
        violation.rule_type,
        violation.severity,
        violation.message.trim()
    ));
    if let (Some(from), Some(kind)) = (&violation.consolidated_from, violation.consolidation_type) {
        output.push_str(&format!("  - Consolidated ({}) from: {}\n", kind, from.join(", ")));
    }
    for suggestion in &violation.suggestions {
        output.push_str(&format!("  - Suggestion: {}\n", suggestion));
    }
    for option in violation.fix_options.iter().flatten() {
        output.push_str(&format!(
            "  - Fix option ({}): {}\n",
            option.kind.as_str(),
            option.description
        ));
    }
}
