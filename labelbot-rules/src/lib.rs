//! Label planning engine for pull-request automation.
//!
//! Rules pair a boolean condition over a [`PullRequestFact`] (base branch,
//! check results, current labels) with label actions. The [`Orchestrator`]
//! runs every rule of the active [`RuleSet`] against a fact and folds the
//! matching rules' actions into a [`LabelMutationPlan`]; when two rules
//! disagree about a label, the one declared later wins.
//!
//! Rule sets are loaded from `pull_request_rules` documents (YAML or JSON)
//! and can be swapped at runtime through the [`RuleRegistry`].

mod action;
mod condition;
mod error;
mod fact;
mod loader;
mod orchestrator;
mod outcome;
mod registry;
mod rule;
mod sink;

pub use action::{apply_actions, Action, LabelDecision, LabelDelta};
pub use condition::{evaluate, Condition, Pattern};
pub use error::{RuleError, SinkError};
pub use fact::{CheckStatus, FactBuilder, FactField, PullRequestFact};
pub use loader::{load_rules, parse_rules};
pub use orchestrator::{plan, Orchestrator};
pub use outcome::{LabelMutationPlan, PlanOutcome};
pub use registry::{RegistryInfo, RuleRegistry};
pub use rule::{matching_rules, Rule, RuleSet};
pub use sink::LabelSink;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_simple_rule() {
        let rules = RuleSet::new(vec![Rule::new(
            "master",
            Condition::equals(FactField::Base, "master"),
            vec![Action::add("target/master")],
        )]);
        let fact = PullRequestFact::builder("master").build();

        let plan = plan(&rules, &fact);

        assert!(plan.to_add.contains("target/master"));
        assert!(plan.to_remove.is_empty());
    }
}
