//! 错误分类：将执行器返回的原始错误映射为工具错误码。
//!
//! Raw executor error classification.
//!
//! Matching is case-insensitive and runs over the full error chain text.
//! Rules are checked in order and the first hit wins:
//!
//! | Code | Triggers |
//! |------|----------|
//! | `NETWORK_ERROR` | `enotfound`, `econnrefused` |
//! | `AUTHENTICATION_ERROR` | `unauthorized`, `api key` |
//! | `RATE_LIMIT_ERROR` | `rate limit` |
//! | `VALIDATION_ERROR` | `invalid`, `validation` |
//! | `TOOL_EXECUTION_ERROR` | anything else |
//!
//! A [`ToolError`] anywhere in the chain is treated as pre-classified and
//! returned unchanged.

use crate::error_code::ToolErrorCode;
use crate::types::ToolError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static RULES: Lazy<Vec<(Regex, ToolErrorCode)>> = Lazy::new(|| {
    [
        (r"(?i)enotfound|econnrefused", ToolErrorCode::NetworkError),
        (r"(?i)unauthorized|api key", ToolErrorCode::AuthenticationError),
        (r"(?i)rate limit", ToolErrorCode::RateLimitError),
        (r"(?i)invalid|validation", ToolErrorCode::ValidationError),
    ]
    .into_iter()
    .map(|(pattern, code)| (Regex::new(pattern).expect("static classifier pattern"), code))
    .collect()
});

/// Error code for a raw message.
pub fn code_for_message(message: &str) -> ToolErrorCode {
    RULES
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, code)| *code)
        .unwrap_or(ToolErrorCode::ToolExecutionError)
}

/// Classify a raw message into a formatted error for `tool_name`.
pub fn classify_message(message: &str, tool_name: &str) -> ToolError {
    ToolError::new(code_for_message(message), message, tool_name)
}

/// Classify an executor error, passing pre-classified errors through.
pub fn classify_error(err: &anyhow::Error, tool_name: &str) -> ToolError {
    if let Some(pre) = err.chain().find_map(|e| e.downcast_ref::<ToolError>()) {
        return pre.clone().for_tool(tool_name);
    }
    classify_message(&format!("{:#}", err), tool_name)
}

pub(crate) fn timeout_error(tool_name: &str, timeout: Duration) -> ToolError {
    ToolError::new(
        ToolErrorCode::Timeout,
        format!("Tool execution timed out after {}ms", timeout.as_millis()),
        tool_name,
    )
}

pub(crate) fn circuit_open_error(tool_name: &str, remaining: Option<Duration>) -> ToolError {
    let message = match remaining {
        Some(r) => format!(
            "Circuit breaker is open for tool '{}' (retry in {}ms)",
            tool_name,
            r.as_millis()
        ),
        None => format!("Circuit breaker is open for tool '{}'", tool_name),
    };
    ToolError::new(ToolErrorCode::CircuitOpen, message, tool_name)
}
