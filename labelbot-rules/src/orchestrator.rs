use tracing::{debug, info};

use crate::action::{apply_actions, LabelDelta};
use crate::error::SinkError;
use crate::fact::PullRequestFact;
use crate::outcome::{LabelMutationPlan, PlanOutcome};
use crate::registry::RuleRegistry;
use crate::rule::RuleSet;
use crate::sink::LabelSink;

/// Computes the label plan for one fact. Later matching rules override
/// earlier ones per label. Never fails; the worst case is an empty plan.
pub fn plan(rule_set: &RuleSet, fact: &PullRequestFact) -> LabelMutationPlan {
    resolve(rule_set, fact).plan
}

fn resolve(rule_set: &RuleSet, fact: &PullRequestFact) -> PlanOutcome {
    let mut outcome = PlanOutcome {
        pull_request: fact.number,
        ..PlanOutcome::default()
    };
    let mut decisions = LabelDelta::new();

    for rule in rule_set.matching_rules(fact) {
        outcome.record_rule(rule.name.clone());
        decisions.merge(apply_actions(&rule.actions, &fact.current_labels));
    }

    outcome.plan = LabelMutationPlan::resolve(&decisions, &fact.current_labels);
    outcome
}

/// Runs the active rule set against incoming facts and forwards the result
/// to a [`LabelSink`].
#[derive(Clone, Default)]
pub struct Orchestrator {
    registry: RuleRegistry,
    dry_run: bool,
}

impl Orchestrator {
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            dry_run: false,
        }
    }

    /// When enabled, [`Orchestrator::dispatch`] computes plans but never calls the sink.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Evaluates the fact against one snapshot of the rule set.
    pub fn evaluate(&self, fact: &PullRequestFact) -> PlanOutcome {
        let (rules, version) = self.registry.versioned_snapshot();
        let mut outcome = resolve(&rules, fact);
        outcome.rules_version = version;

        info!(
            pull_request = fact.number,
            rules_version = version,
            matched = outcome.matched_rules.len(),
            to_add = outcome.plan.to_add.len(),
            to_remove = outcome.plan.to_remove.len(),
            "computed label plan"
        );
        outcome
    }

    /// Evaluates the fact and hands a non-empty plan to the sink.
    pub async fn dispatch<S>(&self, fact: &PullRequestFact, sink: &S) -> Result<PlanOutcome, SinkError>
    where
        S: LabelSink + ?Sized,
    {
        let outcome = self.evaluate(fact);
        if outcome.is_noop() {
            debug!(pull_request = fact.number, "label plan is empty, nothing to apply");
            return Ok(outcome);
        }
        if self.dry_run {
            info!(pull_request = fact.number, "dry run, skipping label sink");
            return Ok(outcome);
        }

        sink.apply(fact.number, &outcome.plan).await?;
        Ok(outcome)
    }
}
