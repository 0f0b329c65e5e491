use crate::span::SpanGroup;
use crate::types::{FixKind, FixOption, FixScope};

const SUGGESTIONS_PER_FIX: usize = 2;
const MAX_PHRASE_WORDS: usize = 4;

/// One option per member, narrowest first
pub fn fix_options(group: &SpanGroup) -> Vec<FixOption> {
    let mut members: Vec<_> = group.members.iter().collect();
    members.sort_by_key(|m| m.span.len());
    let last = members.len().saturating_sub(1);

    members
        .into_iter()
        .enumerate()
        .map(|(i, member)| {
            let kind = match i {
                0 => FixKind::Quick,
                i if i == last => FixKind::Comprehensive,
                _ => FixKind::Intermediate,
            };
            let text = member.span.text.trim();
            let description = match kind {
                FixKind::Quick => format!("Targeted fix for '{}'", text),
                FixKind::Intermediate => format!("Rework '{}'", text),
                FixKind::Comprehensive => format!("Rewrite '{}' as a whole", text),
            };
            FixOption {
                kind,
                text_span: text.to_string(),
                description: format!("{} ({})", description, member.violation.rule_type),
                suggestions: member
                    .violation
                    .suggestions
                    .iter()
                    .take(SUGGESTIONS_PER_FIX)
                    .cloned()
                    .collect(),
                scope: scope_of(text, &member.violation.sentence),
            }
        })
        .collect()
}

fn scope_of(text: &str, sentence: &str) -> FixScope {
    let sentence = sentence.trim().trim_end_matches(['.', '!', '?']);
    let text = text.trim_end_matches(['.', '!', '?']);
    if !sentence.is_empty() && text.eq_ignore_ascii_case(sentence) {
        return FixScope::Sentence;
    }
    match text.split_whitespace().count() {
        0 | 1 => FixScope::Word,
        n if n <= MAX_PHRASE_WORDS => FixScope::Phrase,
        _ => FixScope::Clause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{GroupMember, TextSpan};
    use crate::types::{ConsolidationType, Violation};

    const SENTENCE: &str = "Users should click on the button to save their work.";

    fn member(rule: &str, text: &str, start: usize, suggestions: &[&str]) -> GroupMember {
        GroupMember {
            span: TextSpan {
                text: text.into(),
                start,
                end: start + text.chars().count(),
                sentence_index: 0,
                violation: 0,
            },
            violation: Violation::new(rule, "msg", SENTENCE, 0)
                .with_suggestions(suggestions.iter().copied()),
        }
    }

    fn group(members: Vec<GroupMember>) -> SpanGroup {
        SpanGroup {
            members,
            dominant: 0,
            consolidation_type: ConsolidationType::Nested,
            sentence_index: 0,
        }
    }

    #[test]
    fn test_options_sorted_and_tagged() {
        let group = group(vec![
            member("clause_rule", "click on the button to save their work", 13, &["a", "b", "c"]),
            member("word_rule", "click", 13, &["select"]),
            member("phrase_rule", "click on the button", 13, &[]),
        ]);
        let options = fix_options(&group);
        let kinds: Vec<FixKind> = options.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![FixKind::Quick, FixKind::Intermediate, FixKind::Comprehensive]
        );
        assert_eq!(options[0].text_span, "click");
        assert_eq!(options[0].scope, FixScope::Word);
        assert_eq!(options[0].description, "Targeted fix for 'click' (word_rule)");
        assert_eq!(options[1].scope, FixScope::Phrase);
        assert!(options[1].suggestions.is_empty());
        assert_eq!(options[2].scope, FixScope::Clause);
        assert_eq!(options[2].suggestions, vec!["a", "b"]);
    }

    #[test]
    fn test_two_members_are_quick_and_comprehensive() {
        let group = group(vec![
            member("outer", "click on the button", 13, &[]),
            member("inner", "on the", 19, &[]),
        ]);
        let options = fix_options(&group);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].kind, FixKind::Quick);
        assert_eq!(options[0].text_span, "on the");
        assert_eq!(options[1].kind, FixKind::Comprehensive);
    }

    #[test]
    fn test_whole_sentence_scope() {
        assert_eq!(
            scope_of("Users should click on the button to save their work", SENTENCE),
            FixScope::Sentence
        );
        assert_eq!(scope_of("", SENTENCE), FixScope::Word);
    }
}
