//! Executor configuration.

use crate::legality::LegalityPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ceiling on microsteps per macrostep.
pub const DEFAULT_MAX_MICROSTEPS: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid executor configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("max_microsteps must be at least 1")]
    ZeroMicrosteps,
}

/// Tunables of an [`Executor`](crate::executor::Executor).
///
/// # Example
///
/// ```rust
/// use harel::config::ExecutorConfig;
/// use harel::legality::LegalityPolicy;
///
/// let config = ExecutorConfig::builder()
///     .max_microsteps(50)
///     .legality(LegalityPolicy::Fatal)
///     .build();
/// assert_eq!(config.max_microsteps, 50);
///
/// let parsed = ExecutorConfig::from_json(r#"{"legality": "fatal"}"#).unwrap();
/// assert_eq!(parsed.legality, LegalityPolicy::Fatal);
/// assert_eq!(parsed.max_microsteps, 1000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Microsteps allowed in one macrostep before the machine is stopped.
    pub max_microsteps: usize,

    /// What to do when a step produces an illegal configuration.
    pub legality: LegalityPolicy,

    /// Whether configurations are checked after every step at all.
    pub check_legality: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_microsteps: DEFAULT_MAX_MICROSTEPS,
            legality: LegalityPolicy::Warn,
            check_legality: true,
        }
    }
}

impl ExecutorConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parses a JSON object; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_microsteps == 0 {
            return Err(ConfigError::ZeroMicrosteps);
        }
        Ok(())
    }
}

/// Builder for [`ExecutorConfig`].
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: ExecutorConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values below 1 are raised to 1.
    pub fn max_microsteps(mut self, n: usize) -> Self {
        self.config.max_microsteps = n.max(1);
        self
    }

    pub fn legality(mut self, policy: LegalityPolicy) -> Self {
        self.config.legality = policy;
        self
    }

    pub fn check_legality(mut self, enabled: bool) -> Self {
        self.config.check_legality = enabled;
        self
    }

    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}
