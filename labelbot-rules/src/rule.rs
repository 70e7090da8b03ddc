use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::Action;
use crate::condition::Condition;
use crate::fact::PullRequestFact;

/// A condition paired with the label actions to run when it holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    /// Advisory name used in logs and load errors. Not required to be unique.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "Rule::default_enabled")]
    pub enabled: bool,
    pub condition: Condition,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Rule {
    pub fn new(name: impl Into<String>, condition: Condition, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled: true,
            condition,
            actions,
        }
    }

    pub fn default_enabled() -> bool {
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the rule is enabled and its condition holds for the fact.
    pub fn matches(&self, fact: &PullRequestFact) -> bool {
        self.enabled && self.condition.evaluate(fact)
    }
}

/// Ordered, immutable collection of rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Keeps the rules in the order given; declaration order drives conflict resolution.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule whose condition holds, in declared order. Each rule is
    /// evaluated on its own; a match never stops evaluation of later rules.
    pub fn matching_rules<'a>(&'a self, fact: &PullRequestFact) -> Vec<&'a Rule> {
        self.rules
            .iter()
            .filter(|rule| {
                let matched = rule.matches(fact);
                if matched {
                    debug!(rule = %rule.name, pull_request = fact.number, "rule matched");
                }
                matched
            })
            .collect()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        RuleSet::new(rules)
    }
}

/// Free-function form of [`RuleSet::matching_rules`].
pub fn matching_rules<'a>(rule_set: &'a RuleSet, fact: &PullRequestFact) -> Vec<&'a Rule> {
    rule_set.matching_rules(fact)
}
