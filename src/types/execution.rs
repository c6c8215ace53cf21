//! Execution outcome types.

use super::tool::ToolResult;
use crate::error_code::ToolErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
    Timeout,
}

/// Classified tool failure.
///
/// `message` keeps the raw diagnostic text; `user_message` is a complete
/// sentence meant for direct display.
///
/// Executors may return a `ToolError` (inside their `anyhow::Error`) to
/// pre-classify a failure. Such errors are passed through unchanged; an empty
/// `user_message` is filled in with the tool name.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ToolError {
    pub code: ToolErrorCode,
    pub message: String,
    pub user_message: String,
    pub retryable: bool,
}

impl ToolError {
    /// Create a fully formatted error for `tool_name`.
    pub fn new(code: ToolErrorCode, message: impl Into<String>, tool_name: &str) -> Self {
        Self {
            code,
            message: message.into(),
            user_message: code.user_message(tool_name),
            retryable: code.retryable(),
        }
    }

    /// Create a pre-classified error without a user message.
    pub fn of(code: ToolErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            user_message: String::new(),
            retryable: code.retryable(),
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = user_message.into();
        self
    }

    pub(crate) fn for_tool(mut self, tool_name: &str) -> Self {
        if self.user_message.is_empty() {
            self.user_message = self.code.user_message(tool_name);
        }
        self
    }
}

/// The single outcome produced for every tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionResult {
    pub tool_name: String,
    pub call_id: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    pub execution_time_ms: u64,
    #[serde(default)]
    pub fallback_used: bool,
}

impl ToolExecutionResult {
    pub(crate) fn success(
        tool_name: &str,
        call_id: &str,
        output: Value,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            call_id: call_id.to_string(),
            status: ExecutionStatus::Success,
            output: Some(output),
            error: None,
            execution_time_ms,
            fallback_used: false,
        }
    }

    pub(crate) fn failure(
        tool_name: &str,
        call_id: &str,
        status: ExecutionStatus,
        error: ToolError,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            call_id: call_id.to_string(),
            status,
            output: None,
            error: Some(error),
            execution_time_ms,
            fallback_used: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    pub fn error_code(&self) -> Option<ToolErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Convert into the protocol message answering the originating tool call.
    ///
    /// Fallback output is sent as content, but the message is still flagged
    /// as an error.
    pub fn to_tool_result(&self) -> ToolResult {
        let content = match (&self.output, &self.error) {
            (Some(output), _) => output.clone(),
            (None, Some(err)) => Value::String(err.user_message.clone()),
            (None, None) => Value::Null,
        };
        ToolResult {
            tool_use_id: self.call_id.clone(),
            content,
            is_error: !self.is_success(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pre_classified_error_gets_user_message() {
        let err = ToolError::of(ToolErrorCode::ValidationError, "missing city").for_tool("weather");
        assert_eq!(
            err.user_message,
            "The weather tool received invalid input. Please check the request parameters."
        );
        assert!(!err.retryable);

        let custom = ToolError::of(ToolErrorCode::ValidationError, "x")
            .with_user_message("Pick a city.")
            .for_tool("weather");
        assert_eq!(custom.user_message, "Pick a city.");
    }

    #[test]
    fn test_error_display() {
        let err = ToolError::new(ToolErrorCode::Timeout, "timed out after 50ms", "search");
        assert_eq!(err.to_string(), "TIMEOUT: timed out after 50ms");
    }

    #[test]
    fn test_to_tool_result_prefers_output() {
        let ok = ToolExecutionResult::success("search", "c1", json!({"hits": 3}), 12);
        let msg = ok.to_tool_result();
        assert_eq!(msg.tool_use_id, "c1");
        assert_eq!(msg.content, json!({"hits": 3}));
        assert!(!msg.is_error);

        let err = ToolExecutionResult::failure(
            "search",
            "c2",
            ExecutionStatus::Error,
            ToolError::new(ToolErrorCode::NetworkError, "ECONNREFUSED", "search"),
            5,
        );
        let msg = err.to_tool_result();
        assert!(msg.is_error);
        assert_eq!(
            msg.content,
            json!("The search service is currently unavailable. Please try again later.")
        );
    }

    #[test]
    fn test_serialization_shape() {
        let ok = ToolExecutionResult::success("search", "c1", Value::Null, 3);
        let v = serde_json::to_value(&ok).unwrap();
        assert_eq!(v["status"], "success");
        assert!(v.get("error").is_none());
        assert_eq!(v["fallback_used"], false);
    }
}
