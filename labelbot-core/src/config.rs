use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::ConfigError;

/// Prefix applied to every environment variable read by [`LabelbotConfig::from_env`].
pub const DEFAULT_PREFIX: &str = "LABELBOT_";

/// Rule document used when `LABELBOT_RULES_PATH` is not set.
pub const DEFAULT_RULES_PATH: &str = ".github/labelbot.yml";

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "staging" | "stage" => Some(Environment::Staging),
            "development" | "dev" | "" => Some(Environment::Development),
            _ => None,
        }
    }
}

/// Process configuration for the labelling engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelbotConfig {
    pub rules_path: PathBuf,
    pub environment: Environment,
    pub log_level: String,
}

impl Default for LabelbotConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            environment: Environment::Development,
            log_level: "info".to_string(),
        }
    }
}

impl LabelbotConfig {
    /// Loads configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(DEFAULT_PREFIX)
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `LABELBOT_`).
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => warn!(error = %err, "failed to read .env file"),
        }
        Self::from_lookup(prefix, |key| match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(source) => Err(ConfigError::NotUnicode {
                key: key.to_string(),
                source,
            }),
        })
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(prefix: &str, mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Result<Option<String>, ConfigError>,
    {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);
        let defaults = Self::default();

        let rules_path = lookup(&key("RULES_PATH"))?
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.rules_path);

        let env_key = key("ENV");
        let environment = match lookup(&env_key)? {
            Some(raw) => Environment::parse(&raw).ok_or(ConfigError::InvalidValue {
                key: env_key,
                value: raw,
            })?,
            None => Environment::default(),
        };

        let log_level = lookup(&key("LOG_LEVEL"))?.unwrap_or(defaults.log_level);

        Ok(Self {
            rules_path,
            environment,
            log_level,
        })
    }

}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(
        pairs: &[(&str, &str)],
    ) -> impl FnMut(&str) -> Result<Option<String>, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| Ok(map.get(key).cloned())
    }

    #[test]
    fn falls_back_to_defaults() {
        let cfg = LabelbotConfig::from_lookup("LABELBOT_", lookup_from(&[])).expect("config");
        assert_eq!(cfg, LabelbotConfig::default());
        assert_eq!(cfg.rules_path, PathBuf::from(DEFAULT_RULES_PATH));
    }

    #[test]
    fn reads_prefixed_values() {
        let cfg = LabelbotConfig::from_lookup(
            "BOT_",
            lookup_from(&[
                ("BOT_RULES_PATH", "/etc/labelbot/rules.yml"),
                ("BOT_ENV", "prod"),
                ("BOT_LOG_LEVEL", "debug"),
            ]),
        )
        .expect("config");

        assert_eq!(cfg.rules_path, PathBuf::from("/etc/labelbot/rules.yml"));
        assert_eq!(cfg.environment, Environment::Production);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn rejects_unknown_environment() {
        let err = LabelbotConfig::from_lookup(
            "LABELBOT_",
            lookup_from(&[("LABELBOT_ENV", "prodution")]),
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, ref value } if key == "LABELBOT_ENV" && value == "prodution")
        );
    }

    #[test]
    fn ignores_unknown_keys() {
        let cfg = LabelbotConfig::from_lookup(
            "LABELBOT_",
            lookup_from(&[("LABELBOT_DRY_RUN", "yes"), ("LABELBOT_ENV", "staging")]),
        )
        .expect("config");
        assert_eq!(cfg.environment, Environment::Staging);
        assert_eq!(cfg.rules_path, PathBuf::from(DEFAULT_RULES_PATH));
    }
}
