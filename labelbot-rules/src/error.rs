use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a rule set. Evaluation itself never fails.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rules path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules from {path}: {message}")]
    Parse { path: String, message: String },
    #[error("rule {rule:?}: unrecognized condition operator {operator:?}")]
    UnknownOperator { rule: String, operator: String },
    #[error("rule {rule:?}: unrecognized action field {field:?}")]
    UnknownAction { rule: String, field: String },
    #[error("rule {rule:?}: invalid action: {message}")]
    InvalidAction { rule: String, message: String },
    #[error("rule {rule:?}: invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        message: String,
    },
    #[error("rule {rule:?}: {message}")]
    InvalidCondition { rule: String, message: String },
}

impl RuleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuleError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_operator(rule: &str, operator: impl Into<String>) -> Self {
        RuleError::UnknownOperator {
            rule: rule.to_string(),
            operator: operator.into(),
        }
    }

    pub(crate) fn invalid_condition(rule: &str, message: impl Into<String>) -> Self {
        RuleError::InvalidCondition {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Failure reported by an external [`LabelSink`](crate::LabelSink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("label API request failed: {0}")]
    Request(String),
    #[error("pull request #{0} not found")]
    NotFound(u64),
}
