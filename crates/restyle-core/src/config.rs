//! Session configuration
//!
//! Every field is defaulted, so an empty TOML document is a valid config.

use crate::error::ConfigError;
use crate::retry::OperationType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestyleConfig {
    /// Maximum retained history entries
    pub history_capacity: usize,
    /// Retry orchestrator settings
    pub retry: RetrySettings,
    /// Recovery dispatcher settings
    pub recovery: RecoverySettings,
    /// Error pattern alerting
    pub alerts: AlertSettings,
}

impl Default for RestyleConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            retry: RetrySettings::default(),
            recovery: RecoverySettings::default(),
            alerts: AlertSettings::default(),
        }
    }
}

impl RestyleConfig {
    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError`] for malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot honour
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be at least 1".into()));
        }
        if self.retry.max_retries_ceiling == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_retries_ceiling must be at least 1".into(),
            ));
        }
        for op in OperationType::ALL {
            if let Some(policy) = self.retry.policies.get(op) {
                if policy.backoff_multiplier.is_some_and(|m| !m.is_finite() || m < 1.0) {
                    return Err(ConfigError::Invalid(format!(
                        "retry.policies.{op}.backoff_multiplier must be >= 1.0"
                    )));
                }
            }
        }
        if self.alerts.log_capacity == 0 {
            return Err(ConfigError::Invalid("alerts.log_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// With history capacity
    #[inline]
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// With a policy override for one operation type
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, op: OperationType, policy: PolicyOverride) -> Self {
        *self.retry.policies.get_mut(op) = Some(policy);
        self
    }

    /// With adaptive tuning switched on or off
    #[inline]
    #[must_use]
    pub fn with_adaptive_retry(mut self, adaptive: bool) -> Self {
        self.retry.adaptive = adaptive;
        self
    }

    /// With recovery attempt cap
    #[inline]
    #[must_use]
    pub fn with_recovery_attempts(mut self, max_attempts: u32) -> Self {
        self.recovery.max_attempts = max_attempts;
        self
    }
}

/// Retry orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Tune policies from observed success rates
    pub adaptive: bool,
    /// Rolling samples kept per operation type
    pub window: usize,
    /// Samples needed before adaptation kicks in
    pub min_samples: usize,
    /// Upper bound on adapted `max_retries`
    pub max_retries_ceiling: u32,
    /// Seconds between environment re-estimates
    pub environment_refresh_secs: u64,
    /// Per operation type overrides
    pub policies: PolicyOverrides,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            adaptive: true,
            window: 20,
            min_samples: 5,
            max_retries_ceiling: 10,
            environment_refresh_secs: 30,
            policies: PolicyOverrides::default(),
        }
    }
}

impl RetrySettings {
    /// Environment refresh interval
    #[must_use]
    pub fn environment_refresh(&self) -> Duration {
        Duration::from_secs(self.environment_refresh_secs)
    }
}

/// Optional policy overrides keyed by operation type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyOverrides {
    pub network: Option<PolicyOverride>,
    pub structural_mutation: Option<PolicyOverride>,
    pub validation: Option<PolicyOverride>,
    pub generative: Option<PolicyOverride>,
    pub execution: Option<PolicyOverride>,
}

impl PolicyOverrides {
    /// Override for `op`, if configured
    #[must_use]
    pub fn get(&self, op: OperationType) -> Option<&PolicyOverride> {
        match op {
            OperationType::Network => self.network.as_ref(),
            OperationType::StructuralMutation => self.structural_mutation.as_ref(),
            OperationType::Validation => self.validation.as_ref(),
            OperationType::Generative => self.generative.as_ref(),
            OperationType::Execution => self.execution.as_ref(),
        }
    }

    fn get_mut(&mut self, op: OperationType) -> &mut Option<PolicyOverride> {
        match op {
            OperationType::Network => &mut self.network,
            OperationType::StructuralMutation => &mut self.structural_mutation,
            OperationType::Validation => &mut self.validation,
            OperationType::Generative => &mut self.generative,
            OperationType::Execution => &mut self.execution,
        }
    }
}

/// Partial retry policy; unset fields keep the operation type's default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOverride {
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub jitter: Option<bool>,
    pub timeout_ms: Option<u64>,
}

impl PolicyOverride {
    /// With max retries
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// With base delay
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = Some(millis(delay));
        self
    }

    /// With max delay
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = Some(millis(delay));
        self
    }

    /// With jitter on or off
    #[inline]
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// With per-attempt timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(millis(timeout));
        self
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Recovery dispatcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverySettings {
    /// Attempts per (error type, operation) before giving up
    pub max_attempts: u32,
    /// First recovery wait for transient classes
    pub base_delay_ms: u64,
    /// Cap on recovery waits
    pub max_delay_ms: u64,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

impl RecoverySettings {
    /// Wait before the `attempt`-th (1-based) recovery of a transient error
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }
}

/// Error pattern alert thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Bounded error log size
    pub log_capacity: usize,
    /// Same message this many times within the repeat window
    pub repeat_threshold: usize,
    pub repeat_window_secs: u64,
    /// This many distinct messages within the burst window
    pub burst_threshold: usize,
    pub burst_window_secs: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            log_capacity: 100,
            repeat_threshold: 3,
            repeat_window_secs: 300,
            burst_threshold: 5,
            burst_window_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_the_default() {
        let config = RestyleConfig::from_toml_str("").unwrap();
        assert_eq!(config, RestyleConfig::default());
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.retry.window, 20);
        assert_eq!(config.recovery.max_attempts, 3);
        assert_eq!(config.alerts.burst_threshold, 5);
    }

    #[test]
    fn policy_overrides_parse_by_kebab_name() {
        let config = RestyleConfig::from_toml_str(
            r#"
            history_capacity = 10

            [retry]
            adaptive = false

            [retry.policies.structural-mutation]
            max_retries = 4
            base_delay_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.history_capacity, 10);
        assert!(!config.retry.adaptive);
        let policy = config
            .retry
            .policies
            .get(OperationType::StructuralMutation)
            .unwrap();
        assert_eq!(policy.max_retries, Some(4));
        assert_eq!(policy.base_delay_ms, Some(50));
        assert_eq!(policy.jitter, None);
        assert!(config.retry.policies.get(OperationType::Network).is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = RestyleConfig::from_toml_str("history_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RestyleConfig::from_toml_str(
            "[retry.policies.network]\nbackoff_multiplier = 0.5",
        )
        .unwrap_err();
        assert!(err.to_string().contains("network"));

        let err = RestyleConfig::from_toml_str("history_capacity = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restyle.toml");
        std::fs::write(&path, "[recovery]\nmax_attempts = 5\n").unwrap();
        let config = RestyleConfig::load(&path).unwrap();
        assert_eq!(config.recovery.max_attempts, 5);

        let missing = RestyleConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn builders_and_recovery_delays() {
        let config = RestyleConfig::default()
            .with_history_capacity(5)
            .with_policy(
                OperationType::Network,
                PolicyOverride::default().with_max_retries(7),
            );
        assert_eq!(config.history_capacity, 5);
        assert_eq!(
            config.retry.policies.get(OperationType::Network).unwrap().max_retries,
            Some(7)
        );

        let recovery = RecoverySettings::default();
        assert_eq!(recovery.delay_for(1), Duration::from_secs(1));
        assert_eq!(recovery.delay_for(3), Duration::from_secs(4));
        assert_eq!(recovery.delay_for(10), Duration::from_secs(8));
    }
}
