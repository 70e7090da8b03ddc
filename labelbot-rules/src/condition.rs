use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fact::{CheckStatus, FactField, PullRequestFact};

/// Compiled regular expression used by [`Condition::RegexMatch`].
///
/// Matching is an unanchored search, so `2\.\d` matches `2.3` as well as
/// `release-2.3`.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pattern::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Boolean expression evaluated against a [`PullRequestFact`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Exact string comparison against a scalar field.
    Equals { field: FactField, value: String },
    /// Unanchored regular-expression search on a scalar field.
    RegexMatch { field: FactField, pattern: Pattern },
    /// The named check reported success.
    StatusSuccess { check: String },
    /// The named check reported failure.
    StatusFailure { check: String },
    /// The named check is still running.
    StatusPending { check: String },
    /// The pull request currently carries the label.
    HasLabel { label: String },
    /// Negation of the nested condition.
    Not { condition: Box<Condition> },
    /// Any child holds; an empty list is false.
    Or { conditions: Vec<Condition> },
    /// Every child holds; an empty list is true.
    And { conditions: Vec<Condition> },
}

impl Condition {
    pub fn equals(field: FactField, value: impl Into<String>) -> Self {
        Condition::Equals {
            field,
            value: value.into(),
        }
    }

    pub fn regex(field: FactField, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Condition::RegexMatch {
            field,
            pattern: Pattern::new(pattern)?,
        })
    }

    pub fn status_success(check: impl Into<String>) -> Self {
        Condition::StatusSuccess {
            check: check.into(),
        }
    }

    pub fn has_label(label: impl Into<String>) -> Self {
        Condition::HasLabel {
            label: label.into(),
        }
    }

    pub fn not(condition: Condition) -> Self {
        Condition::Not {
            condition: Box::new(condition),
        }
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or { conditions }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And { conditions }
    }

    /// Evaluates the expression. Missing facts never match: an unreported
    /// check is not a success, an absent field equals nothing.
    pub fn evaluate(&self, fact: &PullRequestFact) -> bool {
        match self {
            Condition::Equals { field, value } => fact
                .field(*field)
                .map(|actual| actual == value)
                .unwrap_or(false),
            Condition::RegexMatch { field, pattern } => fact
                .field(*field)
                .map(|actual| pattern.is_match(actual))
                .unwrap_or(false),
            Condition::StatusSuccess { check } => fact.status(check) == Some(CheckStatus::Success),
            Condition::StatusFailure { check } => fact.status(check) == Some(CheckStatus::Failure),
            Condition::StatusPending { check } => fact.status(check) == Some(CheckStatus::Pending),
            Condition::HasLabel { label } => fact.has_label(label),
            Condition::Not { condition } => !condition.evaluate(fact),
            Condition::Or { conditions } => conditions.iter().any(|child| child.evaluate(fact)),
            Condition::And { conditions } => conditions.iter().all(|child| child.evaluate(fact)),
        }
    }
}

/// Free-function form of [`Condition::evaluate`].
pub fn evaluate(condition: &Condition, fact: &PullRequestFact) -> bool {
    condition.evaluate(fact)
}
