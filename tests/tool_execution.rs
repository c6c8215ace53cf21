//! End-to-end behaviour of `ToolExecutionService::execute_tool`.
//!
//! Time-dependent tests run on a paused tokio clock, so timeouts, backoff
//! and cooldowns resolve instantly and deterministically.

use ai_tool_runtime::resilience::CircuitState;
use ai_tool_runtime::{
    ExecuteOptions, ExecutionStatus, ToolCall, ToolError, ToolErrorCode, ToolExecutionConfig,
    ToolExecutionService, ToolExecutor,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Fails with `message` for the first `failures` invocations, then succeeds.
struct Flaky {
    calls: AtomicU32,
    failures: u32,
    message: &'static str,
    started: Mutex<Vec<Instant>>,
}

impl Flaky {
    fn new(failures: u32, message: &'static str) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures,
            message,
            started: Mutex::new(Vec::new()),
        }
    }

    fn always(message: &'static str) -> Self {
        Self::new(u32::MAX, message)
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolExecutor for Flaky {
    async fn execute(&self, call: &ToolCall) -> anyhow::Result<Value> {
        self.started.lock().unwrap().push(Instant::now());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            anyhow::bail!("{}", self.message);
        }
        Ok(json!({ "tool": call.name, "attempt": n }))
    }
}

/// Never settles.
struct Hang {
    calls: AtomicU32,
}

#[async_trait]
impl ToolExecutor for Hang {
    async fn execute(&self, _call: &ToolCall) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        futures::future::pending::<()>().await;
        Ok(Value::Null)
    }
}

fn call(id: &str, name: &str) -> ToolCall {
    ToolCall::with_id(id, name, Map::new())
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_until_success() {
    let service = ToolExecutionService::default();
    let exec = Flaky::new(2, "connect ECONNREFUSED 10.0.0.7:8080");

    let result = service
        .execute_tool(&call("c1", "search"), &exec, &ExecuteOptions::default())
        .await;

    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(result.output, Some(json!({"tool": "search", "attempt": 3})));
    assert!(result.error.is_none());
    assert_eq!(exec.calls(), 3);

    let metrics = service.get_tool_metrics("search");
    assert_eq!(metrics.total_executions, 1);
    assert_eq!(metrics.success_count, 1);
    assert_eq!(metrics.error_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_reports_last_error() {
    let service = ToolExecutionService::default();
    let exec = Flaky::always("getaddrinfo ENOTFOUND api.weather.test");

    let result = service
        .execute_tool(&call("c1", "weather"), &exec, &ExecuteOptions::default())
        .await;

    assert_eq!(exec.calls(), 3);
    assert_eq!(result.status, ExecutionStatus::Error);
    assert!(result.output.is_none());
    let err = result.error.unwrap();
    assert_eq!(err.code, ToolErrorCode::NetworkError);
    assert!(err.retryable);
    assert_eq!(err.message, "getaddrinfo ENOTFOUND api.weather.test");
    assert_eq!(
        err.user_message,
        "The weather service is currently unavailable. Please try again later."
    );
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_runs_once() {
    let service = ToolExecutionService::default();
    let exec = Flaky::always("Invalid date format: 2024-13-45");

    let result = service
        .execute_tool(&call("c1", "calendar"), &exec, &ExecuteOptions::default())
        .await;

    assert_eq!(exec.calls(), 1);
    assert_eq!(result.error_code(), Some(ToolErrorCode::ValidationError));
    assert!(!result.error.unwrap().retryable);
}

#[tokio::test(start_paused = true)]
async fn test_retry_disabled_and_custom_attempts() {
    let service = ToolExecutionService::default();

    let once = Flaky::always("rate limit exceeded");
    let result = service
        .execute_tool(&call("c1", "t"), &once, &ExecuteOptions::new().without_retry())
        .await;
    assert_eq!(once.calls(), 1);
    assert_eq!(result.error_code(), Some(ToolErrorCode::RateLimitError));

    let five = Flaky::always("boom");
    let result = service
        .execute_tool(
            &call("c2", "t"),
            &five,
            &ExecuteOptions::new().with_max_retries(5),
        )
        .await;
    assert_eq!(five.calls(), 5);
    assert_eq!(result.error_code(), Some(ToolErrorCode::ToolExecutionError));
}

#[tokio::test(start_paused = true)]
async fn test_pre_classified_error_passes_through() {
    let service = ToolExecutionService::default();
    let exec = ai_tool_runtime::from_fn(|_call: ToolCall| async {
        Err::<Value, anyhow::Error>(
            ToolError::of(ToolErrorCode::RateLimitError, "quota spent for today")
                .with_retryable(false)
                .into(),
        )
    });

    let result = service
        .execute_tool(&call("c1", "search"), &exec, &ExecuteOptions::default())
        .await;

    let err = result.error.unwrap();
    assert_eq!(err.code, ToolErrorCode::RateLimitError);
    assert_eq!(err.message, "quota spent for today");
    assert!(!err.retryable);
    assert!(err.user_message.contains("search"));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_of_never_settling_executor() {
    let service = ToolExecutionService::default();
    let exec = Hang {
        calls: AtomicU32::new(0),
    };
    let opts = ExecuteOptions::new()
        .with_timeout(Duration::from_millis(50))
        .without_retry();

    let result = service.execute_tool(&call("c1", "slow"), &exec, &opts).await;

    assert_eq!(result.status, ExecutionStatus::Timeout);
    assert!(result.execution_time_ms >= 50);
    let err = result.error.unwrap();
    assert_eq!(err.code, ToolErrorCode::Timeout);
    assert_eq!(err.message, "Tool execution timed out after 50ms");
    assert!(err.retryable);

    let metrics = service.get_tool_metrics("slow");
    assert_eq!(metrics.timeout_count, 1);
    assert_eq!(metrics.error_count, 1);
    assert_eq!(metrics.success_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried() {
    let service = ToolExecutionService::default();
    let exec = Hang {
        calls: AtomicU32::new(0),
    };
    let opts = ExecuteOptions::new()
        .with_timeout(Duration::from_millis(40))
        .with_max_retries(2);

    let result = service.execute_tool(&call("c1", "slow"), &exec, &opts).await;

    assert_eq!(exec.calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.status, ExecutionStatus::Timeout);
    assert!(result.execution_time_ms >= 80);
}

#[tokio::test(start_paused = true)]
async fn test_exponential_backoff_gaps_grow() {
    let service = ToolExecutionService::default();
    let exec = Flaky::always("connect ECONNREFUSED");
    let opts = ExecuteOptions::new().with_exponential_backoff();

    service.execute_tool(&call("c1", "t"), &exec, &opts).await;

    let started = exec.started.lock().unwrap().clone();
    assert_eq!(started.len(), 3);
    let first_gap = started[1] - started[0];
    let second_gap = started[2] - started[1];
    assert!(first_gap >= Duration::from_millis(100), "{:?}", first_gap);
    assert!(second_gap >= Duration::from_millis(200), "{:?}", second_gap);
    assert!(second_gap > first_gap);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_keeps_growing_past_thirty_seconds() {
    let service = ToolExecutionService::new(
        ToolExecutionConfig::default().with_circuit_breaker(false),
    );
    let exec = Flaky::always("connect ECONNREFUSED");
    let opts = ExecuteOptions::new()
        .with_max_retries(12)
        .with_exponential_backoff();

    service.execute_tool(&call("c1", "t"), &exec, &opts).await;

    let started = exec.started.lock().unwrap().clone();
    assert_eq!(started.len(), 12);
    let gaps: Vec<Duration> = started.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(gaps.windows(2).all(|g| g[1] > g[0]), "{:?}", gaps);
    assert!(gaps[10] >= Duration::from_millis(102_400), "{:?}", gaps[10]);
}

#[tokio::test(start_paused = true)]
async fn test_retries_without_backoff_are_immediate() {
    let service = ToolExecutionService::default();
    let exec = Flaky::always("connect ECONNREFUSED");

    service
        .execute_tool(&call("c1", "t"), &exec, &ExecuteOptions::default())
        .await;

    let started = exec.started.lock().unwrap().clone();
    assert_eq!(started.len(), 3);
    assert_eq!(started[2] - started[0], Duration::ZERO);
}

#[tokio::test]
async fn test_null_output_is_success() {
    let service = ToolExecutionService::default();
    let exec = ai_tool_runtime::from_fn(|_call: ToolCall| async { Ok::<_, anyhow::Error>(Value::Null) });

    let result = service
        .execute_tool(&call("c1", "fire_and_forget"), &exec, &ExecuteOptions::default())
        .await;

    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(result.output, Some(Value::Null));
    assert!(result.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_fallback_substitutes_output_but_keeps_error() {
    let service = ToolExecutionService::default();
    let exec = Flaky::always("upstream exploded");
    let fallback = json!({"forecast": "unknown"});
    let opts = ExecuteOptions::new().with_fallback(fallback.clone());

    let result = service.execute_tool(&call("c1", "weather"), &exec, &opts).await;

    assert_eq!(result.status, ExecutionStatus::Error);
    assert_eq!(result.output, Some(fallback.clone()));
    assert!(result.fallback_used);
    assert_eq!(result.error_code(), Some(ToolErrorCode::ToolExecutionError));
    assert_eq!(service.get_tool_metrics("weather").error_count, 1);

    let message = result.to_tool_result();
    assert!(message.is_error);
    assert_eq!(message.content, fallback);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_with_fallback_reports_error_status() {
    let service = ToolExecutionService::default();
    let exec = Hang {
        calls: AtomicU32::new(0),
    };
    let opts = ExecuteOptions::new()
        .with_timeout(Duration::from_millis(10))
        .without_retry()
        .with_fallback(json!("stale"));

    let result = service.execute_tool(&call("c1", "slow"), &exec, &opts).await;

    assert_eq!(result.status, ExecutionStatus::Error);
    assert_eq!(result.error_code(), Some(ToolErrorCode::Timeout));
    assert!(result.fallback_used);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_trips_per_tool_and_resets() {
    let service = ToolExecutionService::new(
        ToolExecutionConfig::default().with_circuit_breaker_threshold(2),
    );
    let broken = Flaky::always("401 Unauthorized");

    for i in 0..2 {
        let r = service
            .execute_tool(&call(&format!("c{}", i), "mail"), &broken, &ExecuteOptions::default())
            .await;
        assert_eq!(r.error_code(), Some(ToolErrorCode::AuthenticationError));
    }
    assert_eq!(service.circuit_state("mail").state, CircuitState::Open);

    let rejected = service
        .execute_tool(&call("c2", "mail"), &broken, &ExecuteOptions::default())
        .await;
    assert_eq!(broken.calls(), 2);
    assert_eq!(rejected.status, ExecutionStatus::Error);
    let err = rejected.error.unwrap();
    assert_eq!(err.code, ToolErrorCode::CircuitOpen);
    assert!(!err.retryable);
    assert_eq!(service.get_tool_metrics("mail").total_executions, 2);

    // Other tools are unaffected.
    let healthy = Flaky::new(0, "");
    let other = service
        .execute_tool(&call("c3", "calendar"), &healthy, &ExecuteOptions::default())
        .await;
    assert!(other.is_success());

    service.reset_circuit_breaker("mail");
    assert_eq!(service.circuit_state("mail").state, CircuitState::Closed);
    service
        .execute_tool(&call("c4", "mail"), &broken, &ExecuteOptions::default())
        .await;
    assert_eq!(broken.calls(), 3);

    // A success after the reset clears the fresh failure as well.
    let recovered = Flaky::new(0, "");
    let ok = service
        .execute_tool(&call("c5", "mail"), &recovered, &ExecuteOptions::default())
        .await;
    assert!(ok.is_success());
    let snapshot = service.circuit_state("mail");
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_half_open_trial_closes_on_success() {
    let service = ToolExecutionService::new(
        ToolExecutionConfig::default()
            .with_circuit_breaker_threshold(1)
            .with_circuit_breaker_cooldown(Duration::from_secs(1)),
    );
    let exec = Flaky::new(1, "invalid query");

    let first = service
        .execute_tool(&call("c1", "search"), &exec, &ExecuteOptions::default())
        .await;
    assert_eq!(first.error_code(), Some(ToolErrorCode::ValidationError));

    let rejected = service
        .execute_tool(&call("c2", "search"), &exec, &ExecuteOptions::default())
        .await;
    assert_eq!(rejected.error_code(), Some(ToolErrorCode::CircuitOpen));

    tokio::time::advance(Duration::from_secs(1)).await;

    let trial = service
        .execute_tool(&call("c3", "search"), &exec, &ExecuteOptions::default())
        .await;
    assert!(trial.is_success());
    assert_eq!(service.circuit_state("search").state, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_accumulate_across_calls() {
    let service = ToolExecutionService::default();
    let no_retry = ExecuteOptions::new().without_retry();
    let exec = Flaky::new(2, "disk full");

    for i in 0..3 {
        service
            .execute_tool(&call(&format!("c{}", i), "writer"), &exec, &no_retry)
            .await;
    }

    let metrics = service.get_tool_metrics("writer");
    assert_eq!(metrics.total_executions, 3);
    assert_eq!(metrics.success_count, 1);
    assert_eq!(metrics.error_count, 2);
    assert!((metrics.failure_rate - 2.0 / 3.0).abs() < 1e-9);
    assert!(service.all_metrics().contains_key("writer"));
    assert_eq!(service.get_tool_metrics("never_ran").total_executions, 0);
}
