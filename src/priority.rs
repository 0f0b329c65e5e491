use crate::config::{MessagePattern, PriorityConfig, StrategyConfig, SuggestionMerger};
use crate::types::{ConsolidationType, Severity};
use tracing::{debug, trace};

/// Strategy tag when every violation of a group comes from the same rule
pub const SINGLE_RULE: &str = "single_rule";

/// Strategy tag when no configured strategy matches
pub const PRIORITY_BASED_MERGE: &str = "priority_based_merge";

pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{primary_issue} with additional concerns";

/// Score of a rule that matches neither a rule priority nor a category
const DEFAULT_RULE_PRIORITY: i32 = 1;

const WILDCARD: &str = "*";
const KEY_SEPARATOR: &str = " + ";

/// How one group of violations is consolidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub primary_rule: String,
    /// `single_rule`, `priority_based_merge` or a configured name
    pub strategy: String,
    pub message_template: Option<String>,
    pub suggestion_merger: Option<SuggestionMerger>,
}

/// Answers which rule wins a group and how severities escalate
#[derive(Debug, Clone, Copy)]
pub struct PriorityManager<'a> {
    config: &'a PriorityConfig,
}

impl<'a> PriorityManager<'a> {
    pub fn new(config: &'a PriorityConfig) -> Self {
        Self { config }
    }

    /// Explicit score, else category rank (`len - index`), else 1
    pub fn rule_priority(&self, rule_id: &str) -> i32 {
        if let Some(score) = self.config.rule_specific_priorities.get(rule_id) {
            return *score;
        }
        match self.category_index(rule_id) {
            Some(index) => (self.config.category_priorities.len() - index) as i32,
            None => DEFAULT_RULE_PRIORITY,
        }
    }

    /// First configured category the rule id belongs to
    pub fn category_of(&self, rule_id: &str) -> Option<&'a str> {
        self.category_index(rule_id)
            .map(|i| self.config.category_priorities[i].as_str())
    }

    fn category_index(&self, rule_id: &str) -> Option<usize> {
        let rule_head = leading_token(rule_id);
        self.config
            .category_priorities
            .iter()
            .position(|category| rule_id.contains(category.as_str()) || leading_token(category) == rule_head)
    }

    /// Rule that leads the consolidated message; `None` for an empty list
    pub fn primary_rule<S: AsRef<str>>(&self, rule_ids: &[S]) -> Option<String> {
        let rules = unique_sorted(rule_ids);
        match rules.len() {
            0 => None,
            1 => Some(rules[0].to_string()),
            _ => {
                let configured = self
                    .find_strategy(&rules)
                    .and_then(|(key, strategy)| {
                        let primary = strategy.primary_rule.as_deref()?;
                        if rules.contains(&primary) {
                            Some(primary.to_string())
                        } else {
                            debug!(
                                "Strategy '{}' names primary rule '{}' outside the group, ignoring",
                                key, primary
                            );
                            None
                        }
                    });
                configured.or_else(|| self.highest_priority(rule_ids))
            }
        }
    }

    /// Configured strategy for the rule combination, else a priority-based default
    pub fn consolidation_strategy<S: AsRef<str>>(&self, rule_ids: &[S]) -> Strategy {
        let rules = unique_sorted(rule_ids);
        let primary_rule = self.primary_rule(rule_ids).unwrap_or_default();

        if rules.len() == 1 {
            return Strategy {
                primary_rule,
                strategy: SINGLE_RULE.to_string(),
                message_template: None,
                suggestion_merger: None,
            };
        }

        match self.find_strategy(&rules) {
            Some((key, strategy)) => {
                debug!("Using strategy '{}' for [{}]", key, rules.join(", "));
                Strategy {
                    primary_rule,
                    strategy: strategy.strategy.clone(),
                    message_template: strategy.message_template.clone(),
                    suggestion_merger: strategy.suggestion_merger,
                }
            }
            None => Strategy {
                primary_rule,
                strategy: PRIORITY_BASED_MERGE.to_string(),
                message_template: Some(DEFAULT_MESSAGE_TEMPLATE.to_string()),
                suggestion_merger: None,
            },
        }
    }

    pub fn escalate_severity(&self, severities: &[Severity]) -> Severity {
        self.config.severity_escalation.escalate(severities)
    }

    /// Configured pattern for the type, else the built-in one
    pub fn message_pattern(&self, consolidation_type: ConsolidationType) -> MessagePattern {
        self.config
            .message_patterns
            .get(consolidation_type.as_str())
            .cloned()
            .unwrap_or_else(|| builtin_message_pattern(consolidation_type))
    }

    /// Exact key, then `<rule> + *`, then category combination, then `<category> + *`
    fn find_strategy(&self, rules: &[&str]) -> Option<(String, &'a StrategyConfig)> {
        let strategies = &self.config.consolidation_strategies;
        if strategies.is_empty() {
            return None;
        }

        let mut keys = vec![rules.join(KEY_SEPARATOR)];
        keys.extend(rules.iter().map(|rule| wildcard_key(rule)));

        let mut categories: Vec<&str> = rules.iter().filter_map(|r| self.category_of(r)).collect();
        categories.sort_unstable();
        categories.dedup();
        if !categories.is_empty() {
            keys.push(categories.join(KEY_SEPARATOR));
            keys.extend(categories.iter().map(|c| wildcard_key(c)));
        }

        trace!("Strategy key candidates: {:?}", keys);
        keys.into_iter()
            .find_map(|key| strategies.get(&key).map(|strategy| (key, strategy)))
    }

    /// Highest scoring rule, earliest in input order on ties
    fn highest_priority<S: AsRef<str>>(&self, rule_ids: &[S]) -> Option<String> {
        let mut best: Option<(&str, i32)> = None;
        for rule in rule_ids.iter().map(AsRef::as_ref) {
            let score = self.rule_priority(rule);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((rule, score));
            }
        }
        best.map(|(rule, _)| rule.to_string())
    }
}

/// Default phrasing and suggestion merger per consolidation type
pub fn builtin_message_pattern(consolidation_type: ConsolidationType) -> MessagePattern {
    let (template, suggestion_merger) = match consolidation_type {
        ConsolidationType::Overlap => (
            "Multiple issues with '{text_span}': {combined_issue}",
            SuggestionMerger::CombineAndPrioritize,
        ),
        ConsolidationType::Nested => (
            "Multiple issues affecting '{outer_span}': {combined_issue}",
            SuggestionMerger::UseMostComprehensive,
        ),
        ConsolidationType::Adjacent => (
            "Related issues near '{text_span}': {combined_issue}",
            SuggestionMerger::MergeSequentialFixes,
        ),
        _ => (
            "Issues with '{text_span}': {combined_issue}",
            SuggestionMerger::CombineAndPrioritize,
        ),
    };
    MessagePattern {
        template: template.to_string(),
        suggestion_merger,
    }
}

fn unique_sorted<S: AsRef<str>>(rule_ids: &[S]) -> Vec<&str> {
    let mut rules: Vec<&str> = rule_ids.iter().map(AsRef::as_ref).collect();
    rules.sort_unstable();
    rules.dedup();
    rules
}

fn wildcard_key(name: &str) -> String {
    format!("{}{}{}", name, KEY_SEPARATOR, WILDCARD)
}

fn leading_token(id: &str) -> &str {
    id.split('_').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scored(scores: &[(&str, i32)]) -> PriorityConfig {
        PriorityConfig {
            rule_specific_priorities: scores
                .iter()
                .map(|(rule, score)| (rule.to_string(), *score))
                .collect::<BTreeMap<_, _>>(),
            ..PriorityConfig::empty()
        }
    }

    #[test]
    fn test_rule_priority_sources() {
        let config = PriorityConfig::builtin();
        let manager = PriorityManager::new(&config);
        assert_eq!(manager.rule_priority("claims"), 100);
        // "accessibility" is the second of six categories
        assert_eq!(manager.rule_priority("accessibility_alt_text"), 5);
        // shares the leading token with "language_and_grammar"
        assert_eq!(manager.rule_priority("language_tool"), 2);
        assert_eq!(manager.rule_priority("anthropomorphism"), 1);
    }

    #[test]
    fn test_category_of() {
        let config = PriorityConfig::builtin();
        let manager = PriorityManager::new(&config);
        assert_eq!(manager.category_of("legal_information_check"), Some("legal_information"));
        assert_eq!(manager.category_of("structure_headings"), Some("structure_and_format"));
        assert_eq!(manager.category_of("tone"), None);
    }

    #[test]
    fn test_primary_rule_by_priority() {
        let config = scored(&[("A", 10), ("B", 5)]);
        let manager = PriorityManager::new(&config);
        assert_eq!(manager.primary_rule(&["B", "A"]), Some("A".to_string()));
        assert_eq!(manager.primary_rule(&["A"]), Some("A".to_string()));
        assert_eq!(manager.primary_rule::<&str>(&[]), None);
    }

    #[test]
    fn test_primary_rule_ties_keep_input_order() {
        let config = PriorityConfig::empty();
        let manager = PriorityManager::new(&config);
        assert_eq!(manager.primary_rule(&["tone", "clarity"]), Some("tone".to_string()));
    }

    #[test]
    fn test_primary_rule_from_exact_strategy() {
        let config = PriorityConfig::builtin();
        let manager = PriorityManager::new(&config);
        // mouse_buttons scores higher, the strategy names citations
        assert_eq!(
            manager.primary_rule(&["mouse_buttons", "citations"]),
            Some("citations".to_string())
        );
    }

    #[test]
    fn test_primary_rule_from_wildcard_strategy() {
        let mut config = scored(&[("tone", 50)]);
        config.consolidation_strategies.insert(
            "claims + *".into(),
            StrategyConfig {
                primary_rule: Some("claims".into()),
                strategy: "legal_priority".into(),
                message_template: None,
                suggestion_merger: None,
            },
        );
        let manager = PriorityManager::new(&config);
        assert_eq!(
            manager.primary_rule(&["tone", "claims", "tone"]),
            Some("claims".to_string())
        );
    }

    #[test]
    fn test_primary_rule_outside_group_is_ignored() {
        let mut config = scored(&[("b", 3)]);
        config.consolidation_strategies.insert(
            "a + b".into(),
            StrategyConfig {
                primary_rule: Some("z".into()),
                strategy: "odd".into(),
                message_template: None,
                suggestion_merger: None,
            },
        );
        let manager = PriorityManager::new(&config);
        assert_eq!(manager.primary_rule(&["a", "b"]), Some("b".to_string()));
    }

    #[test]
    fn test_strategy_single_rule() {
        let config = PriorityConfig::builtin();
        let manager = PriorityManager::new(&config);
        let strategy = manager.consolidation_strategy(&["tone", "tone"]);
        assert_eq!(strategy.strategy, SINGLE_RULE);
        assert_eq!(strategy.primary_rule, "tone");
        assert_eq!(strategy.message_template, None);
    }

    #[test]
    fn test_strategy_default() {
        let config = scored(&[("A", 10), ("B", 5)]);
        let manager = PriorityManager::new(&config);
        let strategy = manager.consolidation_strategy(&["A", "B"]);
        assert_eq!(
            strategy,
            Strategy {
                primary_rule: "A".into(),
                strategy: PRIORITY_BASED_MERGE.into(),
                message_template: Some(DEFAULT_MESSAGE_TEMPLATE.into()),
                suggestion_merger: None,
            }
        );
    }

    #[test]
    fn test_strategy_by_category_key() {
        let config = PriorityConfig::builtin();
        let manager = PriorityManager::new(&config);
        let strategy = manager.consolidation_strategy(&["language_tool", "accessibility_alt_text"]);
        assert_eq!(strategy.strategy, "accessibility_first");
        assert_eq!(strategy.primary_rule, "accessibility_alt_text");
        assert_eq!(strategy.message_template, None);
        assert_eq!(
            strategy.suggestion_merger,
            Some(SuggestionMerger::CombineAndPrioritize)
        );
    }

    #[test]
    fn test_escalate_severity_uses_config() {
        let mut config = PriorityConfig::builtin();
        let manager = PriorityManager::new(&config);
        let severities = [Severity::Medium, Severity::Medium, Severity::Low];
        assert_eq!(manager.escalate_severity(&severities), Severity::High);

        config.severity_escalation.multiple_medium = Severity::Medium;
        let manager = PriorityManager::new(&config);
        assert_eq!(manager.escalate_severity(&severities), Severity::Medium);
    }

    #[test]
    fn test_message_pattern_fallbacks() {
        let mut config = PriorityConfig::empty();
        config.message_patterns.insert(
            "overlap".into(),
            MessagePattern {
                template: "Overlap at '{text_span}'".into(),
                suggestion_merger: SuggestionMerger::UseMostComprehensive,
            },
        );
        let manager = PriorityManager::new(&config);
        assert_eq!(
            manager.message_pattern(ConsolidationType::Overlap).template,
            "Overlap at '{text_span}'"
        );
        assert_eq!(
            manager.message_pattern(ConsolidationType::Adjacent).suggestion_merger,
            SuggestionMerger::MergeSequentialFixes
        );
        assert_eq!(
            manager.message_pattern(ConsolidationType::Semantic),
            builtin_message_pattern(ConsolidationType::Related)
        );
    }
}
