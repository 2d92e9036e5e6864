//! Environment-driven runtime configuration.

use proctor_policy::{DEFAULT_VIOLATION_THRESHOLD, EscalationPolicy};
use proctor_session::{DEFAULT_REENTRY_DELAY_MS, SessionConfig};
use proctor_submit::validate_submit_base_url;

use crate::AppError;
use crate::logging::LogFormat;

const ENV_SUBMIT_BASE_URL: &str = "PROCTOR_SUBMIT_BASE_URL";
const ENV_VIOLATION_THRESHOLD: &str = "PROCTOR_VIOLATION_THRESHOLD";
const ENV_REENTRY_DELAY_SECONDS: &str = "PROCTOR_REENTRY_DELAY_SECONDS";
const ENV_LOG_FORMAT: &str = "PROCTOR_LOG_FORMAT";
const ENV_LOG_LEVEL: &str = "PROCTOR_LOG_LEVEL";
const ENV_MONITORING_ENABLED: &str = "PROCTOR_MONITORING_ENABLED";

const DEFAULT_SUBMIT_BASE_URL: &str = "https://localhost:3000";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProctorConfig {
    /// Base URL the submit route is appended to.
    pub submit_base_url: String,
    /// Violation count that terminates the interview.
    pub violation_threshold: u32,
    /// Delay before re-requesting fullscreen after an exit.
    pub reentry_delay_ms: u64,
    /// Log line format.
    pub log_format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,
    /// Integrity monitoring kill switch.
    pub monitoring_enabled: bool,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            submit_base_url: DEFAULT_SUBMIT_BASE_URL.to_string(),
            violation_threshold: DEFAULT_VIOLATION_THRESHOLD,
            reentry_delay_ms: DEFAULT_REENTRY_DELAY_MS,
            log_format: LogFormat::Human,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            monitoring_enabled: true,
        }
    }
}

impl ProctorConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for malformed values and
    /// [`AppError::Submit`] for a rejected submission base URL.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup. Unset keys fall
    /// back to defaults.
    ///
    /// # Errors
    /// Same as [`ProctorConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_SUBMIT_BASE_URL) {
            config.submit_base_url = url.trim().to_string();
        }
        validate_submit_base_url(&config.submit_base_url)?;

        if let Some(raw) = lookup(ENV_VIOLATION_THRESHOLD) {
            config.violation_threshold = parse_number(ENV_VIOLATION_THRESHOLD, &raw)?;
        }
        EscalationPolicy::with_threshold(config.violation_threshold)?;

        if let Some(raw) = lookup(ENV_REENTRY_DELAY_SECONDS) {
            let seconds: u64 = parse_number(ENV_REENTRY_DELAY_SECONDS, &raw)?;
            config.reentry_delay_ms = seconds.saturating_mul(1_000);
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.log_format = LogFormat::parse(&raw).ok_or_else(|| {
                AppError::Config(format!("{ENV_LOG_FORMAT} must be human or json, got {raw:?}"))
            })?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL)
            && !level.trim().is_empty()
        {
            config.log_level = level.trim().to_string();
        }

        config.monitoring_enabled = switch_enabled(lookup(ENV_MONITORING_ENABLED));
        Ok(config)
    }

    /// Session tuning derived from this configuration.
    ///
    /// # Errors
    /// Returns [`AppError::Policy`] when the threshold is zero.
    pub fn session_config(&self) -> Result<SessionConfig, AppError> {
        Ok(SessionConfig {
            policy: EscalationPolicy::with_threshold(self.violation_threshold)?,
            reentry_delay_ms: self.reentry_delay_ms,
            monitoring_enabled: self.monitoring_enabled,
        })
    }
}

/// Checks the monitoring kill-switch env var.
///
/// Semantics:
/// - Unset => monitoring enabled.
/// - `0`, `false`, `off` (case-insensitive) => monitoring disabled.
/// - Any other value => monitoring enabled.
pub fn monitoring_enabled_from_env() -> bool {
    switch_enabled(std::env::var(ENV_MONITORING_ENABLED).ok())
}

fn switch_enabled(value: Option<String>) -> bool {
    match value {
        Some(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !matches!(normalized.as_str(), "0" | "false" | "off")
        }
        None => true,
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    //! Unit tests for env parsing.

    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ProctorConfig::from_lookup(lookup(&[])).expect("defaults are valid");
        assert_eq!(config, ProctorConfig::default());
        assert_eq!(config.reentry_delay_ms, 3_000);
    }

    #[test]
    fn overrides_are_applied() {
        let config = ProctorConfig::from_lookup(lookup(&[
            (ENV_SUBMIT_BASE_URL, "https://interviews.example.com"),
            (ENV_VIOLATION_THRESHOLD, "4"),
            (ENV_REENTRY_DELAY_SECONDS, "5"),
            (ENV_LOG_FORMAT, "JSON"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_MONITORING_ENABLED, "off"),
        ]))
        .expect("overrides are valid");

        assert_eq!(config.submit_base_url, "https://interviews.example.com");
        assert_eq!(config.violation_threshold, 4);
        assert_eq!(config.reentry_delay_ms, 5_000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "debug");
        assert!(!config.monitoring_enabled);

        let session = config.session_config().expect("session config");
        assert_eq!(session.policy.threshold, 4);
        assert!(!session.monitoring_enabled);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ProctorConfig::from_lookup(lookup(&[(ENV_VIOLATION_THRESHOLD, "0")])),
            Err(AppError::Policy(_))
        ));
        assert!(matches!(
            ProctorConfig::from_lookup(lookup(&[(ENV_VIOLATION_THRESHOLD, "two")])),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            ProctorConfig::from_lookup(lookup(&[(ENV_SUBMIT_BASE_URL, "http://example.com")])),
            Err(AppError::Submit(_))
        ));
        assert!(matches!(
            ProctorConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])),
            Err(AppError::Config(_))
        ));
    }
}
