//! Retry orchestration
//!
//! Every fallible collaborator call (interpreter requests, structural
//! mutations) runs through [`RetryOrchestrator::execute_with_retry`]:
//!
//! - `max_retries` is the total attempt count, including the first.
//! - Attempt `n` gets `timeout * (1 + 0.1 * (n - 1))`, scaled by the
//!   environment's timeout factor; expiry drops the in-flight future.
//! - Between attempts the orchestrator sleeps
//!   `min(base * multiplier^(n - 1) * environment, max_delay)`, optionally
//!   jittered by up to 5%.
//! - A failing retry predicate stops the loop immediately.
//!
//! With adaptation on, each operation type keeps a rolling window of
//! attempt outcomes. A poor success rate earns more attempts and slower
//! backoff; a near-perfect one relaxes both.

use crate::config::{PolicyOverride, RetrySettings};
use crate::error::RestyleError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Operation classes with their own retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationType {
    Network,
    StructuralMutation,
    Validation,
    Generative,
    Execution,
}

impl OperationType {
    /// Every operation type
    pub const ALL: [Self; 5] = [
        Self::Network,
        Self::StructuralMutation,
        Self::Validation,
        Self::Generative,
        Self::Execution,
    ];

    /// Kebab-case name, as used in configuration
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::StructuralMutation => "structural-mutation",
            Self::Validation => "validation",
            Self::Generative => "generative",
            Self::Execution => "execution",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether an error is worth another attempt
pub type RetryPredicate = Arc<dyn Fn(&RestyleError) -> bool + Send + Sync>;

/// Retry policy for one operation type
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Randomize delays by up to 5%
    pub jitter: bool,
    /// Budget for the first attempt
    pub timeout: Duration,
    pub retry_predicate: RetryPredicate,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter", &self.jitter)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Default policy for an operation type
    #[must_use]
    pub fn for_operation(op: OperationType) -> Self {
        let ms = Duration::from_millis;
        match op {
            OperationType::Network => Self {
                max_retries: 3,
                base_delay: ms(1000),
                max_delay: ms(10_000),
                backoff_multiplier: 2.0,
                jitter: true,
                timeout: ms(10_000),
                retry_predicate: Arc::new(|e: &RestyleError| match e {
                    RestyleError::Network(_) | RestyleError::Timeout { .. } => true,
                    RestyleError::Generative(reason) => !is_permanent_service_failure(reason),
                    _ => false,
                }),
            },
            OperationType::StructuralMutation => Self {
                max_retries: 2,
                base_delay: ms(100),
                max_delay: ms(1000),
                backoff_multiplier: 1.5,
                jitter: false,
                timeout: ms(5000),
                retry_predicate: Arc::new(|e: &RestyleError| {
                    matches!(
                        e,
                        RestyleError::TargetNotFound { .. } | RestyleError::Execution(_)
                    )
                }),
            },
            OperationType::Validation => Self {
                max_retries: 1,
                base_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
                backoff_multiplier: 1.0,
                jitter: false,
                timeout: ms(2000),
                retry_predicate: Arc::new(|_: &RestyleError| false),
            },
            OperationType::Generative => Self {
                max_retries: 3,
                base_delay: ms(2000),
                max_delay: ms(30_000),
                backoff_multiplier: 2.0,
                jitter: true,
                timeout: ms(60_000),
                retry_predicate: Arc::new(|e: &RestyleError| {
                    e.is_retryable() && !is_permanent_service_failure(&e.to_string())
                }),
            },
            OperationType::Execution => Self {
                max_retries: 2,
                base_delay: ms(500),
                max_delay: ms(5000),
                backoff_multiplier: 2.0,
                jitter: true,
                timeout: ms(10_000),
                retry_predicate: Arc::new(|e: &RestyleError| {
                    matches!(e, RestyleError::Execution(_) | RestyleError::Timeout { .. })
                }),
            },
        }
    }

    /// Apply a partial override from configuration
    #[must_use]
    pub fn with_override(mut self, o: &PolicyOverride) -> Self {
        if let Some(v) = o.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = o.base_delay_ms {
            self.base_delay = Duration::from_millis(v);
        }
        if let Some(v) = o.max_delay_ms {
            self.max_delay = Duration::from_millis(v);
        }
        if let Some(v) = o.backoff_multiplier {
            self.backoff_multiplier = v;
        }
        if let Some(v) = o.jitter {
            self.jitter = v;
        }
        if let Some(v) = o.timeout_ms {
            self.timeout = Duration::from_millis(v);
        }
        self
    }

    /// With a custom retry predicate
    #[inline]
    #[must_use]
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&RestyleError) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.retry_predicate = Arc::new(predicate);
        self
    }

    /// Unjittered delay after the `attempt`-th (1-based) failure
    #[must_use]
    pub fn delay_for(&self, attempt: u32, factor: f64) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent) * factor;
        clamp_secs(secs, self.max_delay)
    }

    /// Timeout budget of the `attempt`-th (1-based) attempt
    #[must_use]
    pub fn timeout_for(&self, attempt: u32, factor: f64) -> Duration {
        let growth = 1.0 + 0.1 * f64::from(attempt.saturating_sub(1));
        let secs = self.timeout.as_secs_f64() * growth * factor;
        clamp_secs(secs, Duration::MAX)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

fn clamp_secs(secs: f64, max: Duration) -> Duration {
    if !secs.is_finite() || secs >= max.as_secs_f64() {
        max
    } else if secs <= 0.0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(secs)
    }
}

fn is_permanent_service_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["invalid api key", "unauthorized", "content policy", "quota exceeded"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Observed request latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyLevel {
    #[default]
    Normal,
    Slow,
    VerySlow,
}

/// Observed failure rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorRateLevel {
    #[default]
    Normal,
    Elevated,
    High,
}

/// Coarse estimate of current conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EnvironmentEstimate {
    pub latency: LatencyLevel,
    pub error_rate: ErrorRateLevel,
}

impl EnvironmentEstimate {
    /// Multiplier applied to backoff delays
    #[must_use]
    pub fn delay_factor(&self) -> f64 {
        let latency = match self.latency {
            LatencyLevel::Normal => 1.0,
            LatencyLevel::Slow => 1.5,
            LatencyLevel::VerySlow => 2.0,
        };
        let errors = match self.error_rate {
            ErrorRateLevel::Normal => 1.0,
            ErrorRateLevel::Elevated => 1.25,
            ErrorRateLevel::High => 1.5,
        };
        latency * errors
    }

    /// Multiplier applied to attempt timeouts
    #[must_use]
    pub fn timeout_factor(&self) -> f64 {
        match self.latency {
            LatencyLevel::Normal => 1.0,
            LatencyLevel::Slow => 1.5,
            LatencyLevel::VerySlow => 2.0,
        }
    }

    fn from_samples<'a>(samples: impl Iterator<Item = &'a Sample>, min_samples: usize) -> Self {
        let (count, failures, total) = samples.fold((0usize, 0usize, Duration::ZERO), |acc, s| {
            (acc.0 + 1, acc.1 + usize::from(!s.success), acc.2 + s.duration)
        });
        if count == 0 || count < min_samples {
            return Self::default();
        }
        #[allow(clippy::cast_precision_loss)]
        let (average, error_rate) = (
            total.as_secs_f64() / count as f64,
            failures as f64 / count as f64,
        );
        Self {
            latency: match average {
                a if a < 1.0 => LatencyLevel::Normal,
                a if a < 3.0 => LatencyLevel::Slow,
                _ => LatencyLevel::VerySlow,
            },
            error_rate: match error_rate {
                r if r < 0.1 => ErrorRateLevel::Normal,
                r if r < 0.3 => ErrorRateLevel::Elevated,
                _ => ErrorRateLevel::High,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    success: bool,
    duration: Duration,
}

/// Mutable retry bookkeeping: rolling samples, environment, randomness
///
/// Injectable so tests can pin the environment and seed the jitter.
#[derive(Debug)]
pub struct RetryState {
    samples: HashMap<OperationType, VecDeque<Sample>>,
    window: usize,
    min_samples: usize,
    environment: EnvironmentEstimate,
    pinned: bool,
    refresh_every: Duration,
    last_refresh: Option<Instant>,
    rng: StdRng,
}

impl RetryState {
    /// Fresh state with an OS-seeded jitter source
    #[must_use]
    pub fn new(settings: &RetrySettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Fresh state with a deterministic jitter source
    #[must_use]
    pub fn seeded(settings: &RetrySettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: &RetrySettings, rng: StdRng) -> Self {
        Self {
            samples: HashMap::new(),
            window: settings.window.max(1),
            min_samples: settings.min_samples,
            environment: EnvironmentEstimate::default(),
            pinned: false,
            refresh_every: settings.environment_refresh(),
            last_refresh: None,
            rng,
        }
    }

    /// Fix the environment estimate; it is never re-derived afterwards
    #[must_use]
    pub fn with_environment(mut self, environment: EnvironmentEstimate) -> Self {
        self.environment = environment;
        self.pinned = true;
        self
    }

    /// Current environment estimate
    #[must_use]
    pub fn environment(&self) -> EnvironmentEstimate {
        self.environment
    }

    /// Record one attempt outcome
    pub fn record(&mut self, op: OperationType, success: bool, duration: Duration) {
        let window = self.window;
        let samples = self.samples.entry(op).or_default();
        samples.push_back(Sample { success, duration });
        while samples.len() > window {
            samples.pop_front();
        }
    }

    /// Rolling success rate, `None` below the minimum sample count
    #[must_use]
    pub fn success_rate(&self, op: OperationType) -> Option<f64> {
        let samples = self.samples.get(&op)?;
        if samples.is_empty() || samples.len() < self.min_samples {
            return None;
        }
        let successes = samples.iter().filter(|s| s.success).count();
        #[allow(clippy::cast_precision_loss)]
        Some(successes as f64 / samples.len() as f64)
    }

    /// Number of retained samples for `op`
    #[must_use]
    pub fn sample_count(&self, op: OperationType) -> usize {
        self.samples.get(&op).map_or(0, VecDeque::len)
    }

    fn refresh_environment(&mut self, now: Instant) {
        if self.pinned {
            return;
        }
        let due = self
            .last_refresh
            .map_or(true, |last| now.duration_since(last) >= self.refresh_every);
        if due {
            self.environment = EnvironmentEstimate::from_samples(
                self.samples.values().flatten(),
                self.min_samples,
            );
            self.last_refresh = Some(now);
            tracing::debug!(environment = ?self.environment, "environment re-estimated");
        }
    }

    fn jitter(&mut self, delay: Duration) -> Duration {
        delay.mul_f64(self.rng.random_range(0.95..=1.05))
    }
}

/// Ephemeral per-attempt context handed to the operation
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub operation_type: OperationType,
    /// 1-based attempt number
    pub attempt: u32,
    /// Policy in effect for this run
    pub policy: RetryPolicy,
}

/// Result of a retried operation
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Final success value or the last error
    pub result: Result<T, RestyleError>,
    /// Attempts actually made
    pub attempts: u32,
    /// Wall time from first attempt to final outcome
    pub total_time: Duration,
    /// Sleeps taken between attempts
    pub delays: Vec<Duration>,
}

impl<T> RetryOutcome<T> {
    /// Whether the operation eventually succeeded
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs operations under per-type retry policies
#[derive(Debug)]
pub struct RetryOrchestrator {
    policies: HashMap<OperationType, RetryPolicy>,
    adaptive: bool,
    ceiling: u32,
    state: RetryState,
}

impl RetryOrchestrator {
    /// Build from settings, applying configured overrides
    #[must_use]
    pub fn new(settings: &RetrySettings) -> Self {
        Self::with_state(settings, RetryState::new(settings))
    }

    /// Build with injected state
    #[must_use]
    pub fn with_state(settings: &RetrySettings, state: RetryState) -> Self {
        let policies = OperationType::ALL
            .into_iter()
            .map(|op| {
                let policy = RetryPolicy::for_operation(op);
                let policy = match settings.policies.get(op) {
                    Some(o) => policy.with_override(o),
                    None => policy,
                };
                (op, policy)
            })
            .collect();
        Self {
            policies,
            adaptive: settings.adaptive,
            ceiling: settings.max_retries_ceiling.max(1),
            state,
        }
    }

    /// Replace the policy of one operation type
    pub fn set_policy(&mut self, op: OperationType, policy: RetryPolicy) {
        self.policies.insert(op, policy);
    }

    /// Configured (unadapted) policy
    #[must_use]
    pub fn policy(&self, op: OperationType) -> RetryPolicy {
        self.policies
            .get(&op)
            .cloned()
            .unwrap_or_else(|| RetryPolicy::for_operation(op))
    }

    /// Policy after adaptation to the rolling success rate
    #[must_use]
    pub fn effective_policy(&self, op: OperationType) -> RetryPolicy {
        let mut policy = self.policy(op);
        if !self.adaptive {
            return policy;
        }
        match self.state.success_rate(op) {
            Some(rate) if rate < 0.5 => {
                policy.max_retries = (policy.max_retries + 2).min(self.ceiling);
                policy.base_delay = policy.base_delay.mul_f64(1.5).min(policy.max_delay);
            }
            Some(rate) if rate > 0.9 => {
                policy.max_retries = policy.max_retries.saturating_sub(1).max(1);
                policy.base_delay = policy.base_delay.mul_f64(0.8);
            }
            _ => {}
        }
        policy
    }

    /// Retry bookkeeping
    #[must_use]
    pub fn state(&self) -> &RetryState {
        &self.state
    }

    /// Run `operation` under the policy for `op`
    ///
    /// `label` names the operation in logs and timeout errors.
    pub async fn execute_with_retry<T, F, Fut>(
        &mut self,
        op: OperationType,
        label: &str,
        mut operation: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut(RetryContext) -> Fut,
        Fut: Future<Output = Result<T, RestyleError>>,
    {
        let started = Instant::now();
        self.state.refresh_environment(started);
        let environment = self.state.environment();
        let policy = self.effective_policy(op);
        let attempts = policy.attempts();
        let mut delays = Vec::new();
        let mut attempt = 1;

        loop {
            let budget = policy.timeout_for(attempt, environment.timeout_factor());
            let context = RetryContext {
                operation_type: op,
                attempt,
                policy: policy.clone(),
            };
            let began = Instant::now();
            let result = match tokio::time::timeout(budget, operation(context)).await {
                Ok(result) => result,
                Err(_) => Err(RestyleError::timeout(
                    label,
                    u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
                )),
            };
            self.state.record(op, result.is_ok(), began.elapsed());

            let error = match result {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(%op, label, attempt, "operation succeeded after retry");
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                        total_time: started.elapsed(),
                        delays,
                    };
                }
                Err(error) => error,
            };

            if attempt >= attempts || !(policy.retry_predicate)(&error) {
                tracing::warn!(%op, label, attempt, error = %error, "operation failed");
                return RetryOutcome {
                    result: Err(error),
                    attempts: attempt,
                    total_time: started.elapsed(),
                    delays,
                };
            }

            let mut delay = policy.delay_for(attempt, environment.delay_factor());
            if policy.jitter {
                delay = self.state.jitter(delay).min(policy.max_delay);
            }
            tracing::warn!(
                %op,
                label,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "attempt failed, retrying"
            );
            delays.push(delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn orchestrator(adaptive: bool) -> RetryOrchestrator {
        let settings = RetrySettings {
            adaptive,
            ..RetrySettings::default()
        };
        let state = RetryState::seeded(&settings, 7);
        RetryOrchestrator::with_state(&settings, state)
    }

    #[test]
    fn delays_grow_and_cap() {
        let policy = RetryPolicy::for_operation(OperationType::Network);
        assert_eq!(policy.delay_for(1, 1.0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2, 1.0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3, 1.0), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10, 1.0), Duration::from_secs(10));
        assert_eq!(policy.delay_for(u32::MAX, 1.0), Duration::from_secs(10));
        assert_eq!(policy.delay_for(1, 1.5), Duration::from_millis(1500));
    }

    #[test]
    fn timeouts_grow_ten_percent_per_attempt() {
        let policy = RetryPolicy::for_operation(OperationType::Network);
        assert_eq!(policy.timeout_for(1, 1.0), Duration::from_secs(10));
        assert_eq!(policy.timeout_for(3, 1.0), Duration::from_secs(12));
        assert_eq!(policy.timeout_for(1, 2.0), Duration::from_secs(20));
    }

    #[test]
    fn environment_factors() {
        let env = EnvironmentEstimate {
            latency: LatencyLevel::VerySlow,
            error_rate: ErrorRateLevel::High,
        };
        assert!((env.delay_factor() - 3.0).abs() < f64::EPSILON);
        assert!((env.timeout_factor() - 2.0).abs() < f64::EPSILON);
        assert!((EnvironmentEstimate::default().delay_factor() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn environment_estimate_from_samples() {
        let slow_failures: Vec<Sample> = (0..6)
            .map(|i| Sample {
                success: i % 2 == 0,
                duration: Duration::from_secs(2),
            })
            .collect();
        let env = EnvironmentEstimate::from_samples(slow_failures.iter(), 5);
        assert_eq!(env.latency, LatencyLevel::Slow);
        assert_eq!(env.error_rate, ErrorRateLevel::High);

        let too_few = EnvironmentEstimate::from_samples(slow_failures.iter().take(2), 5);
        assert_eq!(too_few, EnvironmentEstimate::default());
    }

    #[test]
    fn configured_overrides_apply() {
        let mut settings = RetrySettings::default();
        settings.policies.network = Some(PolicyOverride::default().with_max_retries(6).with_jitter(false));
        let orchestrator = RetryOrchestrator::with_state(&settings, RetryState::seeded(&settings, 1));
        let policy = orchestrator.policy(OperationType::Network);
        assert_eq!(policy.max_retries, 6);
        assert!(!policy.jitter);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn adaptation_follows_success_rate() {
        let mut o = orchestrator(true);
        for _ in 0..6 {
            o.state.record(OperationType::Network, false, Duration::from_millis(10));
        }
        let policy = o.effective_policy(OperationType::Network);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(1500));

        let mut o = orchestrator(true);
        for _ in 0..10 {
            o.state.record(OperationType::Network, true, Duration::from_millis(10));
        }
        let policy = o.effective_policy(OperationType::Network);
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(800));

        let mut o = orchestrator(false);
        for _ in 0..6 {
            o.state.record(OperationType::Network, false, Duration::from_millis(10));
        }
        assert_eq!(o.effective_policy(OperationType::Network).max_retries, 3);
    }

    #[test]
    fn adaptation_respects_ceiling_and_floor() {
        let settings = RetrySettings {
            max_retries_ceiling: 4,
            ..RetrySettings::default()
        };
        let mut o = RetryOrchestrator::with_state(&settings, RetryState::seeded(&settings, 3));
        for _ in 0..5 {
            o.state.record(OperationType::Network, false, Duration::ZERO);
            o.state.record(OperationType::Validation, true, Duration::ZERO);
        }
        assert_eq!(o.effective_policy(OperationType::Network).max_retries, 4);
        assert_eq!(o.effective_policy(OperationType::Validation).max_retries, 1);
    }

    #[test]
    fn rolling_window_is_bounded() {
        let settings = RetrySettings {
            window: 3,
            ..RetrySettings::default()
        };
        let mut state = RetryState::seeded(&settings, 0);
        for _ in 0..10 {
            state.record(OperationType::Execution, true, Duration::ZERO);
        }
        assert_eq!(state.sample_count(OperationType::Execution), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let mut o = orchestrator(false);
        let calls = AtomicU32::new(0);
        let outcome = o
            .execute_with_retry(OperationType::Network, "fetch", |ctx| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                assert_eq!(ctx.attempt, n);
                async move {
                    if n < 3 {
                        Err(RestyleError::Network("connection reset".into()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(outcome.result.unwrap(), "done");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.delays.len(), 2);
    }

    #[test]
    fn network_policy_retries_service_overload_but_not_bad_credentials() {
        let policy = RetryPolicy::for_operation(OperationType::Network);
        let retry = |e: RestyleError| (policy.retry_predicate)(&e);
        assert!(retry(RestyleError::Generative("model overloaded".into())));
        assert!(retry(RestyleError::Generative("HTTP 429 rate limit".into())));
        assert!(!retry(RestyleError::Generative("invalid API key".into())));
        assert!(!retry(RestyleError::Permission("403".into())));
        assert!(!retry(RestyleError::Serialization("bad json".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_stops_immediately() {
        let mut o = orchestrator(false);
        let outcome: RetryOutcome<()> = o
            .execute_with_retry(OperationType::Network, "fetch", |_| async {
                Err(RestyleError::Permission("blocked".into()))
            })
            .await;
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.delays.is_empty());
        assert!(matches!(outcome.result, Err(RestyleError::Permission(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out() {
        let mut o = orchestrator(false);
        o.set_policy(
            OperationType::Network,
            RetryPolicy::for_operation(OperationType::Network)
                .with_override(&PolicyOverride::default().with_timeout(Duration::from_millis(100)).with_max_retries(2)),
        );
        let outcome: RetryOutcome<()> = o
            .execute_with_retry(OperationType::Network, "interpret", |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert_eq!(outcome.attempts, 2);
        match outcome.result {
            Err(RestyleError::Timeout { operation, .. }) => assert_eq!(operation, "interpret"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn jittered_delays_stay_within_five_percent() {
        let mut o = orchestrator(false);
        let outcome: RetryOutcome<()> = o
            .execute_with_retry(OperationType::Network, "fetch", |_| async {
                Err(RestyleError::Network("down".into()))
            })
            .await;
        assert_eq!(outcome.delays.len(), 2);
        let first = outcome.delays[0].as_secs_f64();
        let second = outcome.delays[1].as_secs_f64();
        assert!((0.95..=1.05).contains(&first), "{first}");
        assert!((1.9..=2.1).contains(&second), "{second}");
    }
}
