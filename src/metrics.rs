//! Per-tool execution metrics.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Accumulated outcome counts for one tool.
///
/// Only the terminal outcome of each call is counted; retried attempts and
/// circuit-breaker rejections are not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolMetrics {
    pub total_executions: u64,
    pub success_count: u64,
    /// Failed executions, timeouts included.
    pub error_count: u64,
    /// Failed executions whose last attempt timed out.
    pub timeout_count: u64,
    /// Running mean over all executions.
    pub avg_execution_time_ms: f64,
    /// `error_count / total_executions`.
    pub failure_rate: f64,
}

impl ToolMetrics {
    fn record(&mut self, execution_time_ms: u64) {
        self.total_executions += 1;
        let n = self.total_executions as f64;
        self.avg_execution_time_ms += (execution_time_ms as f64 - self.avg_execution_time_ms) / n;
    }

    fn refresh_rate(&mut self) {
        self.failure_rate = if self.total_executions == 0 {
            0.0
        } else {
            self.error_count as f64 / self.total_executions as f64
        };
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_executions as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    tools: Mutex<HashMap<String, ToolMetrics>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ToolMetrics>> {
        self.tools.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_success(&self, tool_name: &str, execution_time_ms: u64) {
        let mut tools = self.lock();
        let m = tools.entry(tool_name.to_string()).or_default();
        m.record(execution_time_ms);
        m.success_count += 1;
        m.refresh_rate();
    }

    pub fn record_failure(&self, tool_name: &str, execution_time_ms: u64, timed_out: bool) {
        let mut tools = self.lock();
        let m = tools.entry(tool_name.to_string()).or_default();
        m.record(execution_time_ms);
        m.error_count += 1;
        if timed_out {
            m.timeout_count += 1;
        }
        m.refresh_rate();
    }

    /// Zero-valued metrics for tools that never ran.
    pub fn get(&self, tool_name: &str) -> ToolMetrics {
        self.lock().get(tool_name).cloned().unwrap_or_default()
    }

    pub fn snapshot(&self) -> HashMap<String, ToolMetrics> {
        self.lock().clone()
    }
}
