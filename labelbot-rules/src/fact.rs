use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Result reported by a named check or commit status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Success,
    Failure,
    Pending,
}

impl CheckStatus {
    /// Maps a platform status state or check-run conclusion onto a [`CheckStatus`].
    ///
    /// Returns `None` for values that carry no verdict; such reports are
    /// treated as if the check had never been reported.
    pub fn from_github(state: &str) -> Option<Self> {
        match state.trim().to_ascii_lowercase().as_str() {
            "success" | "neutral" | "skipped" => Some(CheckStatus::Success),
            "failure" | "error" | "cancelled" | "timed_out" | "action_required"
            | "startup_failure" => Some(CheckStatus::Failure),
            "pending" | "queued" | "in_progress" | "waiting" | "requested" | "stale" => {
                Some(CheckStatus::Pending)
            }
            _ => None,
        }
    }
}

/// Scalar pull-request fields a condition may compare against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FactField {
    /// Target branch of the pull request.
    Base,
    /// Source branch of the pull request.
    Head,
    Author,
    Title,
}

impl FactField {
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "base" => Some(FactField::Base),
            "head" => Some(FactField::Head),
            "author" => Some(FactField::Author),
            "title" => Some(FactField::Title),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FactField::Base => "base",
            FactField::Head => "head",
            FactField::Author => "author",
            FactField::Title => "title",
        }
    }
}

/// Immutable snapshot of the pull-request facts used for one evaluation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestFact {
    #[serde(default)]
    pub number: u64,
    pub base_branch: String,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub check_statuses: BTreeMap<String, CheckStatus>,
    #[serde(default)]
    pub current_labels: BTreeSet<String>,
}

impl PullRequestFact {
    pub fn builder(base_branch: impl Into<String>) -> FactBuilder {
        FactBuilder::new(base_branch)
    }

    /// Value of a scalar field, `None` when the event did not carry it.
    pub fn field(&self, field: FactField) -> Option<&str> {
        match field {
            FactField::Base => Some(self.base_branch.as_str()),
            FactField::Head => self.head_branch.as_deref(),
            FactField::Author => self.author.as_deref(),
            FactField::Title => self.title.as_deref(),
        }
    }

    pub fn status(&self, check: &str) -> Option<CheckStatus> {
        self.check_statuses.get(check).copied()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.current_labels.contains(label)
    }
}

/// Incrementally assembles a [`PullRequestFact`] from event data.
#[derive(Debug, Clone)]
pub struct FactBuilder {
    fact: PullRequestFact,
}

impl FactBuilder {
    pub fn new(base_branch: impl Into<String>) -> Self {
        Self {
            fact: PullRequestFact {
                base_branch: base_branch.into(),
                ..PullRequestFact::default()
            },
        }
    }

    pub fn number(mut self, number: u64) -> Self {
        self.fact.number = number;
        self
    }

    pub fn head(mut self, head: impl Into<String>) -> Self {
        self.fact.head_branch = Some(head.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.fact.author = Some(author.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.fact.title = Some(title.into());
        self
    }

    /// Records a check result. A later report for the same check replaces the earlier one.
    pub fn check(mut self, name: impl Into<String>, status: CheckStatus) -> Self {
        self.fact.check_statuses.insert(name.into(), status);
        self
    }

    /// Records a raw platform state (e.g. `"success"`, `"timed_out"`).
    /// Unrecognised states are dropped.
    pub fn report(self, name: impl Into<String>, state: &str) -> Self {
        let name = name.into();
        match CheckStatus::from_github(state) {
            Some(status) => self.check(name, status),
            None => {
                warn!(check = %name, state, "ignoring check report with unknown state");
                self
            }
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.fact.current_labels.insert(label.into());
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fact
            .current_labels
            .extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> PullRequestFact {
        self.fact
    }
}
