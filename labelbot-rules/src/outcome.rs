use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::action::{LabelDecision, LabelDelta};

/// Conflict-resolved label changes for one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelMutationPlan {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

impl LabelMutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partitions the final decisions against the labels already present.
    /// Each label carries one decision, so the two sets never overlap.
    pub fn resolve(delta: &LabelDelta, current_labels: &BTreeSet<String>) -> Self {
        let mut plan = Self::new();
        for (label, decision) in delta.decisions() {
            let present = current_labels.contains(label);
            match decision {
                LabelDecision::Add if !present => {
                    plan.to_add.insert(label.to_string());
                }
                LabelDecision::Remove if present => {
                    plan.to_remove.insert(label.to_string());
                }
                _ => {}
            }
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn is_disjoint(&self) -> bool {
        self.to_add.is_disjoint(&self.to_remove)
    }
}

/// Report of one orchestrated evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanOutcome {
    pub pull_request: u64,
    /// Names of the matching rules, in declared order.
    pub matched_rules: Vec<String>,
    pub plan: LabelMutationPlan,
    /// Version of the rule set the plan was computed from.
    #[serde(default)]
    pub rules_version: u64,
}

impl PlanOutcome {
    pub fn record_rule(&mut self, name: impl Into<String>) {
        self.matched_rules.push(name.into());
    }

    pub fn is_noop(&self) -> bool {
        self.plan.is_empty()
    }
}
