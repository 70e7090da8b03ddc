use thiserror::Error;

/// Result type used across the labelbot core crate.
pub type Result<T> = std::result::Result<T, LabelbotError>;

/// Canonical error representation shared by the labelbot crates.
#[derive(Debug, Error)]
pub enum LabelbotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("environment variable {key} is not valid unicode")]
    NotUnicode {
        key: String,
        #[source]
        source: std::env::VarError,
    },
}

impl From<ConfigError> for LabelbotError {
    fn from(value: ConfigError) -> Self {
        LabelbotError::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_canonical_error() {
        let err: LabelbotError = ConfigError::InvalidValue {
            key: "LABELBOT_ENV".into(),
            value: "prodution".into(),
        }
        .into();
        assert!(matches!(err, LabelbotError::Config(_)));
        assert!(err.to_string().contains("LABELBOT_ENV"));
    }
}
