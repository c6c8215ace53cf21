//! 工具错误码：定义 7 个工具执行错误码及其重试语义。
//!
//! Tool execution error codes.
//!
//! Every failed tool call is reported with exactly one of these codes. The
//! code decides whether the service retries the call and which user-facing
//! sentence is attached to the error.
//!
//! ## Error Code Categories
//!
//! | Category    | Codes                                   | Retryable |
//! |-------------|-----------------------------------------|-----------|
//! | transport   | `TIMEOUT`, `NETWORK_ERROR`              | yes       |
//! | rate        | `RATE_LIMIT_ERROR`                      | yes       |
//! | tool        | `TOOL_EXECUTION_ERROR`                  | yes       |
//! | client      | `AUTHENTICATION_ERROR`, `VALIDATION_ERROR` | no     |
//! | guard       | `CIRCUIT_OPEN`                          | no        |
//!
//! ## Example
//!
//! ```rust
//! use ai_tool_runtime::error_code::ToolErrorCode;
//!
//! let code = ToolErrorCode::from_code("RATE_LIMIT_ERROR").unwrap();
//! assert!(code.retryable());
//! assert_eq!(code.category(), "rate");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of tool failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolErrorCode {
    /// The executor did not settle within the allotted time
    Timeout,
    /// Connection-level failure (DNS lookup, refused connection)
    NetworkError,
    /// Upstream throttling
    RateLimitError,
    /// Unclassified failure
    ToolExecutionError,
    /// Credential or authorization failure
    AuthenticationError,
    /// Malformed input
    ValidationError,
    /// The tool's circuit breaker is open
    CircuitOpen,
}

impl ToolErrorCode {
    pub const ALL: [ToolErrorCode; 7] = [
        Self::Timeout,
        Self::NetworkError,
        Self::RateLimitError,
        Self::ToolExecutionError,
        Self::AuthenticationError,
        Self::ValidationError,
        Self::CircuitOpen,
    ];

    /// Returns the wire tag (e.g., `"TIMEOUT"`).
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::RateLimitError => "RATE_LIMIT_ERROR",
            Self::ToolExecutionError => "TOOL_EXECUTION_ERROR",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::CircuitOpen => "CIRCUIT_OPEN",
        }
    }

    /// Returns the snake case name (e.g., `"rate_limit_error"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NetworkError => "network_error",
            Self::RateLimitError => "rate_limit_error",
            Self::ToolExecutionError => "tool_execution_error",
            Self::AuthenticationError => "authentication_error",
            Self::ValidationError => "validation_error",
            Self::CircuitOpen => "circuit_open",
        }
    }

    /// Returns whether a failure with this code is retried by default.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::NetworkError | Self::RateLimitError | Self::ToolExecutionError
        )
    }

    /// Returns the category: `"transport"`, `"rate"`, `"tool"`, `"client"` or `"guard"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Timeout | Self::NetworkError => "transport",
            Self::RateLimitError => "rate",
            Self::ToolExecutionError => "tool",
            Self::AuthenticationError | Self::ValidationError => "client",
            Self::CircuitOpen => "guard",
        }
    }

    /// Parses a wire tag or snake case name.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code || c.name() == code)
    }

    /// Human-friendly sentence for end users, with the tool name interpolated.
    pub fn user_message(&self, tool_name: &str) -> String {
        match self {
            Self::Timeout => format!(
                "The {} tool took too long to respond. Please try again.",
                tool_name
            ),
            Self::NetworkError => format!(
                "The {} service is currently unavailable. Please try again later.",
                tool_name
            ),
            Self::RateLimitError => format!(
                "The {} tool is receiving too many requests. Please wait a moment and try again.",
                tool_name
            ),
            Self::ToolExecutionError => format!(
                "The {} tool encountered an unexpected error. Please try again.",
                tool_name
            ),
            Self::AuthenticationError => format!(
                "The {} tool could not authenticate. Please check its credentials or API key.",
                tool_name
            ),
            Self::ValidationError => format!(
                "The {} tool received invalid input. Please check the request parameters.",
                tool_name
            ),
            Self::CircuitOpen => format!(
                "The {} tool is temporarily disabled after repeated failures. Please try again later.",
                tool_name
            ),
        }
    }
}

impl fmt::Display for ToolErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
