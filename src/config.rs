use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;

/// Tuning for a [`MarkerLexer`](crate::lexer::MarkerLexer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexerConfig {
    /// How long a spawned scan waits for the consumer to ask for the next
    /// token before giving up. `None` waits forever.
    #[serde(default, with = "optional_duration_ms")]
    pub emit_timeout: Option<Duration>,

    #[serde(default)]
    pub unclosed: UnclosedPolicy,
}

/// What to do when input ends with an object or attribute still open.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UnclosedPolicy {
    /// Emit the end-of-stream token anyway and log a warning.
    #[default]
    Lenient,
    /// Fail the scan with [`LexError::Unclosed`](crate::lexer::LexError::Unclosed)
    /// instead of emitting the end-of-stream token.
    Strict,
}

impl LexerConfig {
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.emit_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::Invalid(
                "emit_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_unclosed(mut self, policy: UnclosedPolicy) -> Self {
        self.unclosed = policy;
        self
    }

    pub fn with_emit_timeout(mut self, timeout: Duration) -> Self {
        self.emit_timeout = Some(timeout);
        self
    }
}

mod optional_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
