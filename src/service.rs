//! 工具执行服务：超时、重试、熔断与指标统计。
//!
//! Tool execution service.
//!
//! [`ToolExecutionService`] runs a [`ToolCall`] through a caller-supplied
//! [`ToolExecutor`] and always answers with exactly one
//! [`ToolExecutionResult`]. Executor failures never escape: they are
//! classified, formatted and returned.
//!
//! ## Timeouts and cancellation
//!
//! Each attempt races the executor future against a timer. When the timer
//! wins the executor future is dropped, which cancels it at its next
//! suspension point. Work the executor handed off to a spawned task is not
//! cancelled and keeps running in the background.

use crate::batch::validate_response_match;
use crate::classify::{circuit_open_error, classify_error, timeout_error};
use crate::config::{ExecuteOptions, ToolExecutionConfig};
use crate::error_code::ToolErrorCode;
use crate::executor::ToolExecutor;
use crate::metrics::{MetricsRegistry, ToolMetrics};
use crate::resilience::{Admission, CircuitBreakerRegistry, CircuitBreakerSnapshot, CircuitState};
use crate::telemetry::{
    noop_sink, timestamp_ms, AttemptFailed, AttemptStarted, CircuitRejected, Completed,
    ExecutionEvent, ExecutionSink,
};
use crate::types::{ExecutionStatus, ToolCall, ToolError, ToolExecutionResult};
use crate::Result;
use arc_swap::ArcSwap;
use futures::future::join_all;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub struct ToolExecutionService {
    config: ArcSwap<ToolExecutionConfig>,
    breakers: CircuitBreakerRegistry,
    metrics: MetricsRegistry,
    sink: Arc<dyn ExecutionSink>,
}

impl ToolExecutionService {
    pub fn new(config: ToolExecutionConfig) -> Self {
        Self {
            breakers: CircuitBreakerRegistry::new(config.circuit_breaker()),
            config: ArcSwap::from_pointee(config),
            metrics: MetricsRegistry::new(),
            sink: noop_sink(),
        }
    }

    /// Like [`new`](Self::new), rejecting invalid configuration.
    pub fn try_new(config: ToolExecutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Attach an event sink.
    ///
    /// Each report is awaited inline and bounded by the call's attempt
    /// timeout; a report that overruns it is abandoned and the execution
    /// continues. Sinks should hand events off rather than block.
    pub fn with_sink(mut self, sink: Arc<dyn ExecutionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> ToolExecutionConfig {
        self.config.load().as_ref().clone()
    }

    /// Swap the active configuration. Metrics and circuit state are kept.
    pub fn reconfigure(&self, config: ToolExecutionConfig) -> Result<()> {
        config.validate()?;
        self.breakers.set_config(config.circuit_breaker());
        self.config.store(Arc::new(config));
        Ok(())
    }

    /// Execute one tool call with timeout, retry and circuit breaking.
    pub async fn execute_tool<E>(
        &self,
        call: &ToolCall,
        executor: &E,
        options: &ExecuteOptions,
    ) -> ToolExecutionResult
    where
        E: ToolExecutor + ?Sized,
    {
        let config = self.config.load_full();
        let start = Instant::now();
        let timeout = options.timeout.unwrap_or_else(|| config.default_timeout());

        if config.enable_circuit_breaker {
            if let Admission::Rejected { remaining } = self.breakers.admit(&call.name) {
                warn!(
                    tool_name = %call.name,
                    call_id = %call.id,
                    remaining_ms = remaining.map(|r| r.as_millis() as u64),
                    "circuit breaker open, rejecting tool call"
                );
                let event = ExecutionEvent::CircuitRejected(CircuitRejected {
                    tool_name: call.name.clone(),
                    call_id: call.id.clone(),
                    remaining_ms: remaining.map(|r| r.as_millis() as u64),
                    timestamp_ms: timestamp_ms(),
                });
                self.emit(event, timeout).await;
                return ToolExecutionResult::failure(
                    &call.name,
                    &call.id,
                    ExecutionStatus::Error,
                    circuit_open_error(&call.name, remaining),
                    elapsed_ms(start),
                );
            }
        }

        let max_attempts = if options.retry {
            options.max_retries.unwrap_or(config.max_retries).max(1)
        } else {
            1
        };
        let backoff = config.backoff();

        let mut attempt = 0u32;
        let last_error: ToolError = loop {
            attempt += 1;
            info!(
                tool_name = %call.name,
                call_id = %call.id,
                attempt,
                parameters = %call.parameters_value(),
                timestamp_ms = timestamp_ms(),
                "executing tool"
            );
            self.emit(
                ExecutionEvent::AttemptStarted(AttemptStarted::new(call, attempt)),
                timeout,
            )
            .await;

            let err = match tokio::time::timeout(timeout, executor.execute(call)).await {
                Ok(Ok(output)) => {
                    let elapsed = elapsed_ms(start);
                    self.metrics.record_success(&call.name, elapsed);
                    if config.enable_circuit_breaker {
                        self.breakers.on_success(&call.name);
                    }
                    debug!(
                        tool_name = %call.name,
                        call_id = %call.id,
                        attempt,
                        execution_time_ms = elapsed,
                        "tool succeeded"
                    );
                    self.emit_completed(
                        call,
                        ExecutionStatus::Success,
                        attempt,
                        elapsed,
                        false,
                        timeout,
                    )
                    .await;
                    return ToolExecutionResult::success(&call.name, &call.id, output, elapsed);
                }
                Ok(Err(err)) => classify_error(&err, &call.name),
                Err(_) => timeout_error(&call.name, timeout),
            };

            let will_retry = err.retryable && attempt < max_attempts;
            warn!(
                tool_name = %call.name,
                call_id = %call.id,
                attempt,
                max_attempts,
                code = %err.code,
                error = %err.message,
                will_retry,
                "tool attempt failed"
            );
            let event = ExecutionEvent::AttemptFailed(AttemptFailed {
                tool_name: call.name.clone(),
                call_id: call.id.clone(),
                attempt,
                code: err.code,
                message: err.message.clone(),
                will_retry,
                timestamp_ms: timestamp_ms(),
            });
            self.emit(event, timeout).await;

            if !will_retry {
                break err;
            }
            if options.exponential_backoff {
                tokio::time::sleep(backoff.delay(attempt)).await;
            }
        };

        let elapsed = elapsed_ms(start);
        let timed_out = last_error.code == ToolErrorCode::Timeout;
        self.metrics.record_failure(&call.name, elapsed, timed_out);
        if config.enable_circuit_breaker
            && self.breakers.on_failure(&call.name) == CircuitState::Open
        {
            warn!(tool_name = %call.name, "circuit breaker open");
        }

        let status = if timed_out {
            ExecutionStatus::Timeout
        } else {
            ExecutionStatus::Error
        };
        let mut result =
            ToolExecutionResult::failure(&call.name, &call.id, status, last_error, elapsed);
        if let Some(fallback) = &options.fallback {
            result.status = ExecutionStatus::Error;
            result.output = Some(fallback.clone());
            result.fallback_used = true;
        }
        warn!(
            tool_name = %call.name,
            call_id = %call.id,
            attempts = attempt,
            execution_time_ms = elapsed,
            fallback_used = result.fallback_used,
            "tool failed"
        );
        self.emit_completed(
            call,
            result.status,
            attempt,
            elapsed,
            result.fallback_used,
            timeout,
        )
        .await;
        result
    }

    /// Execute all calls concurrently; `results[i]` answers `calls[i]`.
    ///
    /// There is no concurrency limit: every call is in flight at once.
    pub async fn execute_tool_batch<E>(
        &self,
        calls: &[ToolCall],
        executor: &E,
        options: &ExecuteOptions,
    ) -> Vec<ToolExecutionResult>
    where
        E: ToolExecutor + ?Sized,
    {
        let results = join_all(
            calls
                .iter()
                .map(|call| self.execute_tool(call, executor, options)),
        )
        .await;

        let verdict = validate_response_match(calls, &results);
        if let Some(reason) = verdict.error {
            error!(calls = calls.len(), results = results.len(), %reason, "tool batch response mismatch");
        }
        results
    }

    /// Zero-valued metrics if the tool never executed.
    pub fn get_tool_metrics(&self, tool_name: &str) -> ToolMetrics {
        self.metrics.get(tool_name)
    }

    pub fn all_metrics(&self) -> HashMap<String, ToolMetrics> {
        self.metrics.snapshot()
    }

    pub fn reset_circuit_breaker(&self, tool_name: &str) {
        self.breakers.reset(tool_name);
        info!(tool_name, "circuit breaker reset");
    }

    pub fn circuit_state(&self, tool_name: &str) -> CircuitBreakerSnapshot {
        self.breakers.snapshot(tool_name)
    }

    async fn emit_completed(
        &self,
        call: &ToolCall,
        status: ExecutionStatus,
        attempts: u32,
        execution_time_ms: u64,
        fallback_used: bool,
        limit: Duration,
    ) {
        let event = ExecutionEvent::Completed(Completed {
            tool_name: call.name.clone(),
            call_id: call.id.clone(),
            status,
            attempts,
            execution_time_ms,
            fallback_used,
            timestamp_ms: timestamp_ms(),
        });
        self.emit(event, limit).await;
    }

    async fn emit(&self, event: ExecutionEvent, limit: Duration) {
        match tokio::time::timeout(limit, self.sink.report(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "execution sink rejected event"),
            Err(_) => warn!(
                limit_ms = limit.as_millis() as u64,
                "execution sink timed out, event dropped"
            ),
        }
    }
}

impl Default for ToolExecutionService {
    fn default() -> Self {
        Self::new(ToolExecutionConfig::default())
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

static DEFAULT_SERVICE: Lazy<ToolExecutionService> = Lazy::new(ToolExecutionService::default);

/// Process-wide service with the default configuration
/// (30s timeout, 3 attempts, breaker after 5 failures with a 60s cooldown).
pub fn default_service() -> &'static ToolExecutionService {
    &DEFAULT_SERVICE
}
