use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Label mutation requested by a rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "label", rename_all = "snake_case")]
pub enum Action {
    AddLabel(String),
    RemoveLabel(String),
}

impl Action {
    pub fn add(label: impl Into<String>) -> Self {
        Action::AddLabel(label.into())
    }

    pub fn remove(label: impl Into<String>) -> Self {
        Action::RemoveLabel(label.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Action::AddLabel(label) | Action::RemoveLabel(label) => label,
        }
    }

    pub fn decision(&self) -> LabelDecision {
        match self {
            Action::AddLabel(_) => LabelDecision::Add,
            Action::RemoveLabel(_) => LabelDecision::Remove,
        }
    }
}

/// Final intent for a single label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LabelDecision {
    Add,
    Remove,
}

/// Per-label decisions produced by one or more action lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LabelDelta {
    decisions: BTreeMap<String, LabelDecision>,
}

impl LabelDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a decision, replacing any earlier one for the same label.
    pub fn record(&mut self, label: impl Into<String>, decision: LabelDecision) {
        self.decisions.insert(label.into(), decision);
    }

    pub fn decision(&self, label: &str) -> Option<LabelDecision> {
        self.decisions.get(label).copied()
    }

    pub fn decisions(&self) -> impl Iterator<Item = (&str, LabelDecision)> {
        self.decisions
            .iter()
            .map(|(label, decision)| (label.as_str(), *decision))
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Folds a later delta into this one; the later delta wins per label.
    pub fn merge(&mut self, later: LabelDelta) {
        self.decisions.extend(later.decisions);
    }

    /// The label set obtained by applying this delta to `current`.
    pub fn desired_labels(&self, current: &BTreeSet<String>) -> BTreeSet<String> {
        let mut desired = current.clone();
        for (label, decision) in &self.decisions {
            match decision {
                LabelDecision::Add => {
                    desired.insert(label.clone());
                }
                LabelDecision::Remove => {
                    desired.remove(label);
                }
            }
        }
        desired
    }
}

/// Processes one rule's action list in declared order; the last instruction
/// for a label wins. The current label set does not influence the decisions,
/// so repeated application yields the same delta.
pub fn apply_actions(actions: &[Action], _current_labels: &BTreeSet<String>) -> LabelDelta {
    let mut delta = LabelDelta::new();
    for action in actions {
        delta.record(action.label(), action.decision());
    }
    delta
}
