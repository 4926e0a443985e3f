//! Retry policy bounds and selector generation over the sample page

use pretty_assertions::assert_eq;
use restyle_core::{
    EnvironmentEstimate, ErrorRateLevel, LatencyLevel, OperationType, PolicyOverride,
    RestyleConfig, RestyleError, RetryContext, RetryOrchestrator, RetryOutcome, RetryState,
    TargetResolver,
};
use restyle_dom::LiveTree;
use restyle_test_utils::{sample_page, FlakyOperation};
use std::time::Duration;

fn orchestrator(config: &RestyleConfig) -> RetryOrchestrator {
    RetryOrchestrator::with_state(&config.retry, RetryState::seeded(&config.retry, 11))
}

#[tokio::test(start_paused = true)]
async fn attempts_never_exceed_the_ceiling_and_delays_never_shrink() {
    let config = RestyleConfig::default().with_policy(
        OperationType::Network,
        PolicyOverride::default().with_max_retries(5).with_jitter(false),
    );
    let mut retry = orchestrator(&config);
    let flaky = FlakyOperation::always(RestyleError::Network("connection refused".into()));

    let outcome = retry
        .execute_with_retry(OperationType::Network, "fetch", |_| {
            let result = flaky.call();
            async move { result }
        })
        .await;

    assert!(outcome.result.is_err());
    assert_eq!(outcome.attempts, 5);
    assert_eq!(flaky.calls(), 5);
    assert_eq!(
        outcome.delays,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
        ]
    );
    assert!(outcome.delays.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(outcome.total_time >= Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn flaky_operation_recovers_within_budget() {
    let mut retry = orchestrator(&RestyleConfig::default());
    let flaky = FlakyOperation::new(1, RestyleError::Generative("model overloaded".into()));

    let outcome = retry
        .execute_with_retry(OperationType::Generative, "complete", |_| {
            let result = flaky.call();
            async move { result }
        })
        .await;

    assert_eq!(outcome.result.unwrap(), 2);
    assert_eq!(outcome.delays.len(), 1);
    let delay = outcome.delays[0];
    assert!(delay >= Duration::from_millis(1900) && delay <= Duration::from_millis(2100));
}

#[tokio::test(start_paused = true)]
async fn validation_failures_are_never_retried() {
    let mut retry = orchestrator(&RestyleConfig::default());
    let flaky = FlakyOperation::always(RestyleError::Validation("bad value".into()));

    let outcome = retry
        .execute_with_retry(OperationType::Validation, "validate", |_| {
            let result = flaky.call();
            async move { result }
        })
        .await;

    assert_eq!(outcome.attempts, 1);
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn configured_timeout_bounds_each_attempt() {
    let config = RestyleConfig::default().with_policy(
        OperationType::Execution,
        PolicyOverride::default()
            .with_max_retries(1)
            .with_timeout(Duration::from_millis(200)),
    );
    let mut retry = orchestrator(&config);

    let outcome: restyle_core::RetryOutcome<()> = retry
        .execute_with_retry(OperationType::Execution, "apply", |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

    let error = outcome.result.unwrap_err();
    assert!(matches!(error, RestyleError::Timeout { .. }), "{error}");
    assert!(outcome.total_time < Duration::from_secs(1));
}

/// Fails once, then needs 1.2s of work
async fn busy_then_slow(ctx: RetryContext) -> Result<(), RestyleError> {
    if ctx.attempt == 1 {
        return Err(RestyleError::Execution("renderer busy".into()));
    }
    tokio::time::sleep(Duration::from_millis(1200)).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_environment_stretches_timeouts_and_delays() {
    let config = RestyleConfig::default().with_policy(
        OperationType::Execution,
        PolicyOverride::default()
            .with_max_retries(2)
            .with_jitter(false)
            .with_timeout(Duration::from_secs(1)),
    );

    // second attempt budget: 1s * 1.1 = 1.1s, too short for 1.2s of work
    let mut normal = orchestrator(&config);
    let outcome: RetryOutcome<()> = normal
        .execute_with_retry(OperationType::Execution, "apply", busy_then_slow)
        .await;
    assert!(matches!(outcome.result, Err(RestyleError::Timeout { .. })));
    assert_eq!(outcome.delays, vec![Duration::from_millis(500)]);

    // slow latency scales both by 1.5: 1.65s budget, 750ms backoff
    let slow = EnvironmentEstimate {
        latency: LatencyLevel::Slow,
        error_rate: ErrorRateLevel::Normal,
    };
    let state = RetryState::seeded(&config.retry, 11).with_environment(slow);
    let mut stretched = RetryOrchestrator::with_state(&config.retry, state);
    let outcome: RetryOutcome<()> = stretched
        .execute_with_retry(OperationType::Execution, "apply", busy_then_slow)
        .await;
    assert!(outcome.result.is_ok(), "{:?}", outcome.result);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.delays, vec![Duration::from_millis(750)]);
    assert_eq!(stretched.state().environment(), slow);
}

#[test]
fn every_generated_selector_resolves_to_its_element() {
    let (tree, page) = sample_page();
    let resolver = TargetResolver::new();
    let elements = tree.query_all("*").unwrap();
    assert!(elements.len() > 10);

    for element in elements {
        let selector = resolver.generate_selector(&tree, element);
        assert_eq!(
            tree.query_all(selector.as_str()).unwrap(),
            vec![element],
            "{selector}"
        );
    }
    assert_eq!(resolver.generate_selector(&tree, page.hero).as_str(), "#hero");
    assert_eq!(
        resolver.generate_selector(&tree, page.primary_button).as_str(),
        ".btn-primary"
    );
}

#[test]
fn resolution_is_a_distinct_union_in_request_order() {
    let (tree, page) = sample_page();
    let resolver = TargetResolver::new();
    let found = resolver.resolve(&tree, &[".btn", ".btn-primary", "#missing", "#hero"]);
    assert_eq!(found, vec![page.primary_button, page.secondary_button, page.hero]);
}
