//! Execution event types.

use crate::error_code::ToolErrorCode;
use crate::types::{ExecutionStatus, ToolCall};
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One attempt is about to invoke the executor.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptStarted {
    pub tool_name: String,
    pub call_id: String,
    pub attempt: u32,
    pub parameters: Value,
    pub timestamp_ms: u64,
}

impl AttemptStarted {
    pub fn new(call: &ToolCall, attempt: u32) -> Self {
        Self {
            tool_name: call.name.clone(),
            call_id: call.id.clone(),
            attempt,
            parameters: call.parameters_value(),
            timestamp_ms: timestamp_ms(),
        }
    }
}

/// One attempt failed.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptFailed {
    pub tool_name: String,
    pub call_id: String,
    pub attempt: u32,
    pub code: ToolErrorCode,
    pub message: String,
    pub will_retry: bool,
    pub timestamp_ms: u64,
}

/// The call was refused by an open circuit.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitRejected {
    pub tool_name: String,
    pub call_id: String,
    pub remaining_ms: Option<u64>,
    pub timestamp_ms: u64,
}

/// Terminal outcome of a call.
#[derive(Debug, Clone, Serialize)]
pub struct Completed {
    pub tool_name: String,
    pub call_id: String,
    pub status: ExecutionStatus,
    pub attempts: u32,
    pub execution_time_ms: u64,
    pub fallback_used: bool,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    AttemptStarted(AttemptStarted),
    AttemptFailed(AttemptFailed),
    CircuitRejected(CircuitRejected),
    Completed(Completed),
}

impl ExecutionEvent {
    pub fn call_id(&self) -> &str {
        match self {
            ExecutionEvent::AttemptStarted(e) => &e.call_id,
            ExecutionEvent::AttemptFailed(e) => &e.call_id,
            ExecutionEvent::CircuitRejected(e) => &e.call_id,
            ExecutionEvent::Completed(e) => &e.call_id,
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            ExecutionEvent::AttemptStarted(e) => &e.tool_name,
            ExecutionEvent::AttemptFailed(e) => &e.tool_name,
            ExecutionEvent::CircuitRejected(e) => &e.tool_name,
            ExecutionEvent::Completed(e) => &e.tool_name,
        }
    }
}

/// Execution event sink trait.
#[async_trait]
pub trait ExecutionSink: Send + Sync {
    async fn report(&self, event: ExecutionEvent) -> Result<()>;
    async fn report_batch(&self, events: Vec<ExecutionEvent>) -> Result<()> {
        for e in events {
            self.report(e).await?;
        }
        Ok(())
    }
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// No-op sink (default).
pub struct NoopExecutionSink;

#[async_trait]
impl ExecutionSink for NoopExecutionSink {
    async fn report(&self, _: ExecutionEvent) -> Result<()> {
        Ok(())
    }
}

/// Returns a no-op execution sink.
pub fn noop_sink() -> Arc<dyn ExecutionSink> {
    Arc::new(NoopExecutionSink)
}
