use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RuleError;
use crate::loader::load_rules;
use crate::rule::RuleSet;

/// Metadata about the rule set currently in effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryInfo {
    pub version: u64,
    pub rule_count: usize,
    pub loaded_at: DateTime<Utc>,
    /// Where the rules came from, if they were loaded from disk.
    pub source: Option<String>,
}

struct Active {
    rules: Arc<RuleSet>,
    info: RegistryInfo,
}

/// Process-wide holder of the active [`RuleSet`].
///
/// Readers take an `Arc` snapshot and keep evaluating against it even if a
/// reload happens meanwhile; a reload swaps in a fully built set in one step.
#[derive(Clone)]
pub struct RuleRegistry {
    inner: Arc<RwLock<Active>>,
    versions: Arc<AtomicU64>,
}

impl RuleRegistry {
    pub fn new(rules: RuleSet) -> Self {
        Self::initial(rules, None)
    }

    /// Loads the initial rule set; a configuration error is returned to the caller.
    /// The loaded rules are published as version 1.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let rules = load_rules(path)?;
        let registry = Self::initial(RuleSet::new(rules), Some(path.display().to_string()));
        info!(path = %path.display(), rule_count = registry.info().rule_count, "rule set loaded");
        Ok(registry)
    }

    fn initial(rules: RuleSet, source: Option<String>) -> Self {
        let info = RegistryInfo {
            version: 1,
            rule_count: rules.len(),
            loaded_at: Utc::now(),
            source,
        };
        Self {
            inner: Arc::new(RwLock::new(Active {
                rules: Arc::new(rules),
                info,
            })),
            versions: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The rule set in effect right now.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        Arc::clone(&self.inner.read().rules)
    }

    /// Snapshot together with the version it was published under.
    pub fn versioned_snapshot(&self) -> (Arc<RuleSet>, u64) {
        let active = self.inner.read();
        (Arc::clone(&active.rules), active.info.version)
    }

    pub fn info(&self) -> RegistryInfo {
        self.inner.read().info.clone()
    }

    /// Publishes a new rule set and returns its version.
    pub fn replace(&self, rules: RuleSet) -> u64 {
        self.publish(rules, None)
    }

    /// Reads and validates the rules at `path`, then swaps them in. On error
    /// the previously active set stays in place.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<u64, RuleError> {
        let path = path.as_ref();
        match load_rules(path) {
            Ok(rules) => Ok(self.publish(
                RuleSet::new(rules),
                Some(path.display().to_string()),
            )),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "rule reload failed, keeping active rule set");
                Err(err)
            }
        }
    }

    fn publish(&self, rules: RuleSet, source: Option<String>) -> u64 {
        let rule_count = rules.len();
        let mut active = self.inner.write();
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        active.rules = Arc::new(rules);
        active.info = RegistryInfo {
            version,
            rule_count,
            loaded_at: Utc::now(),
            source,
        };
        info!(version, rule_count, "rule set published");
        version
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::action::Action;
    use crate::condition::Condition;
    use crate::rule::Rule;

    const VALID: &str = r#"
pull_request_rules:
  - name: everything
    conditions: []
    actions:
      label:
        add: [triage]
"#;

    #[test]
    fn snapshots_survive_replacement() {
        let registry = RuleRegistry::new(RuleSet::new(vec![Rule::new(
            "old",
            Condition::and(vec![]),
            vec![Action::add("old")],
        )]));
        let before = registry.snapshot();

        let version = registry.replace(RuleSet::default());

        assert_eq!(version, 2);
        assert_eq!(before.len(), 1);
        assert!(registry.snapshot().is_empty());
        assert_eq!(registry.info().rule_count, 0);
    }

    #[test]
    fn failed_reload_keeps_previous_rules() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.yml");
        fs::write(&path, VALID).expect("write rules");

        let registry = RuleRegistry::from_path(&path).expect("initial load");
        let loaded = registry.info();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.rule_count, 1);
        assert_eq!(loaded.source.as_deref(), Some(path.display().to_string().as_str()));

        fs::write(
            &path,
            "pull_request_rules:\n  - name: broken\n    conditions: [\"approved-reviews-by=@team\"]\n",
        )
        .expect("write rules");
        let err = registry.reload_from_path(&path).unwrap_err();

        assert!(matches!(err, RuleError::UnknownOperator { .. }));
        assert_eq!(registry.info().version, loaded.version);
        assert_eq!(registry.snapshot().rules()[0].name, "everything");
    }

    #[test]
    fn reload_after_initial_load_bumps_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.yml");
        fs::write(&path, VALID).expect("write rules");

        let registry = RuleRegistry::from_path(&path).expect("initial load");
        assert_eq!(registry.versioned_snapshot().1, 1);

        let version = registry.reload_from_path(&path).expect("reload");
        assert_eq!(version, 2);
        assert_eq!(registry.info().version, 2);
    }

    #[test]
    fn clones_share_the_active_set() {
        let registry = RuleRegistry::default();
        let clone = registry.clone();
        clone.replace(RuleSet::new(vec![Rule::new("shared", Condition::and(vec![]), vec![])]));

        assert_eq!(registry.snapshot().len(), 1);
        assert_eq!(registry.info().version, clone.info().version);
    }
}
