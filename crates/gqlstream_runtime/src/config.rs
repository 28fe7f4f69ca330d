//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default marker that requests incremental delivery for a query.
pub const DEFAULT_INCREMENTAL_MARKER: &str = "@defer";

/// Default bounded wait for delivering a trigger.
pub const DEFAULT_TRIGGER_TIMEOUT: Duration = Duration::from_secs(1);

/// Error raised while loading or validating an [`EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration document was not valid JSON for this shape.
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the engine cannot run with.
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// Delivery engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long `signal` waits for a suspended producer before giving up.
    #[serde(rename = "trigger_timeout_ms", with = "duration_ms")]
    pub trigger_timeout: Duration,

    /// Substring of the raw query that selects incremental delivery.
    pub incremental_marker: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_timeout: DEFAULT_TRIGGER_TIMEOUT,
            incremental_marker: DEFAULT_INCREMENTAL_MARKER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trigger delivery timeout.
    pub fn with_trigger_timeout(mut self, timeout: Duration) -> Self {
        self.trigger_timeout = timeout;
        self
    }

    /// Sets the incremental delivery marker.
    pub fn with_incremental_marker(mut self, marker: impl Into<String>) -> Self {
        self.incremental_marker = marker.into();
        self
    }

    /// Parses and validates a JSON config document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "trigger_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.incremental_marker.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "incremental_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.trigger_timeout, Duration::from_secs(1));
        assert_eq!(config.incremental_marker, "@defer");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_trigger_timeout(Duration::from_millis(50))
            .with_incremental_marker("@stream");

        assert_eq!(config.trigger_timeout, Duration::from_millis(50));
        assert_eq!(config.incremental_marker, "@stream");
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json_str(r#"{"trigger_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.trigger_timeout, Duration::from_millis(250));
        assert_eq!(config.incremental_marker, DEFAULT_INCREMENTAL_MARKER);
    }

    #[test]
    fn test_from_json_rejects_zero_timeout() {
        let err = EngineConfig::from_json_str(r#"{"trigger_timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = EngineConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_serialize_uses_millis() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();
        assert_eq!(json["trigger_timeout_ms"], 1000);
    }
}
