//! Service and per-call configuration.
//!
//! [`ToolExecutionConfig`] can be built in code, parsed from YAML, or read
//! from `TOOL_EXEC_*` environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TOOL_EXEC_DEFAULT_TIMEOUT_MS` | `default_timeout_ms` |
//! | `TOOL_EXEC_MAX_RETRIES` | `max_retries` |
//! | `TOOL_EXEC_ENABLE_CIRCUIT_BREAKER` | `enable_circuit_breaker` |
//! | `TOOL_EXEC_CIRCUIT_BREAKER_THRESHOLD` | `circuit_breaker_threshold` |
//! | `TOOL_EXEC_CIRCUIT_BREAKER_COOLDOWN_MS` | `circuit_breaker_cooldown_ms` |
//! | `TOOL_EXEC_BASE_BACKOFF_MS` | `base_backoff_ms` |

use crate::resilience::{Backoff, CircuitBreakerConfig};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolExecutionConfig {
    pub default_timeout_ms: u64,
    /// Total attempts per call, the first one included.
    pub max_retries: u32,
    pub enable_circuit_breaker: bool,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown_ms: u64,
    pub base_backoff_ms: u64,
}

impl Default for ToolExecutionConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            max_retries: 3,
            enable_circuit_breaker: true,
            circuit_breaker_threshold: 5,
            circuit_breaker_cooldown_ms: 60_000,
            base_backoff_ms: 100,
        }
    }
}

impl ToolExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_circuit_breaker(mut self, enabled: bool) -> Self {
        self.enable_circuit_breaker = enabled;
        self
    }

    pub fn with_circuit_breaker_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker_threshold = threshold;
        self
    }

    pub fn with_circuit_breaker_cooldown(mut self, cooldown: Duration) -> Self {
        self.circuit_breaker_cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn with_base_backoff(mut self, delay: Duration) -> Self {
        self.base_backoff_ms = delay.as_millis() as u64;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn circuit_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new()
            .with_failure_threshold(self.circuit_breaker_threshold)
            .with_cooldown(Duration::from_millis(self.circuit_breaker_cooldown_ms))
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(Duration::from_millis(self.base_backoff_ms))
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.default_timeout_ms == 0, "default_timeout_ms", "must be greater than 0"),
            (self.max_retries == 0, "max_retries", "must be at least 1"),
            (
                self.circuit_breaker_threshold == 0,
                "circuit_breaker_threshold",
                "must be at least 1",
            ),
            (self.base_backoff_ms == 0, "base_backoff_ms", "must be greater than 0"),
        ];
        for (failed, field, reason) in checks {
            if failed {
                return Err(Error::configuration_with_context(
                    format!("{} {}", field, reason),
                    ErrorContext::new()
                        .with_field_path(format!("config.{}", field))
                        .with_source("config_loader"),
                ));
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Defaults overlaid with `TOOL_EXEC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed like the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, "TOOL_EXEC_DEFAULT_TIMEOUT_MS")? {
            config.default_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "TOOL_EXEC_MAX_RETRIES")? {
            config.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "TOOL_EXEC_ENABLE_CIRCUIT_BREAKER")? {
            config.enable_circuit_breaker = v;
        }
        if let Some(v) = parse_var(&lookup, "TOOL_EXEC_CIRCUIT_BREAKER_THRESHOLD")? {
            config.circuit_breaker_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "TOOL_EXEC_CIRCUIT_BREAKER_COOLDOWN_MS")? {
            config.circuit_breaker_cooldown_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "TOOL_EXEC_BASE_BACKOFF_MS")? {
            config.base_backoff_ms = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim().parse::<T>().map(Some).map_err(|e| {
        Error::configuration_with_context(
            format!("cannot parse {}={:?}: {}", key, raw, e),
            ErrorContext::new()
                .with_field_path(key)
                .with_source("config_loader"),
        )
    })
}

/// Per-call overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOptions {
    /// Per-attempt timeout; the service default when `None`.
    pub timeout: Option<Duration>,
    /// When false, exactly one attempt is made.
    pub retry: bool,
    /// Total attempts; the service default when `None`.
    pub max_retries: Option<u32>,
    pub exponential_backoff: bool,
    /// Substituted for `output` when the call ultimately fails.
    pub fallback: Option<Value>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            retry: true,
            max_retries: None,
            exponential_backoff: false,
            fallback: None,
        }
    }
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.retry = false;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_exponential_backoff(mut self) -> Self {
        self.exponential_backoff = true;
        self
    }

    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = Some(fallback);
        self
    }
}
