//! # ai-tool-runtime
//!
//! 面向 AI 智能体的工具调用可靠执行层：超时、重试、熔断与指标统计。
//!
//! Reliable execution of agent tool calls.
//!
//! ## Overview
//!
//! Agent loops issue tool calls and expect exactly one structured answer per
//! call, in call order. This crate wraps caller-supplied executors so that
//! contract holds no matter how the tool behaves: it imposes per-attempt
//! timeouts, retries transient failures, trips a per-tool circuit breaker
//! after repeated failures, and turns every failure into a classified,
//! user-presentable [`ToolError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_tool_runtime::{from_fn, ExecuteOptions, ToolCall, ToolExecutionService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ToolExecutionService::default();
//!     let weather = from_fn(|call: ToolCall| async move {
//!         Ok::<_, anyhow::Error>(json!({ "city": call.parameters["city"], "temp_c": 21 }))
//!     });
//!
//!     let call = ToolCall::new("weather_tool", Default::default())
//!         .with_parameter("city", json!("Lisbon"));
//!     let result = service
//!         .execute_tool(&call, &weather, &ExecuteOptions::default())
//!         .await;
//!
//!     // Always a result; check `status`, not just `output`.
//!     println!("{:?} {:?}", result.status, result.output);
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`service`] | [`ToolExecutionService`] and the process-wide default instance |
//! | [`batch`] | Response/call correspondence validation |
//! | [`classify`] | Raw error classification |
//! | [`error_code`] | Tool failure taxonomy |
//! | [`executor`] | [`ToolExecutor`] seam and closure adapter |
//! | [`registry`] | Name-based dispatch with JSON Schema parameter validation |
//! | [`resilience`] | Per-tool circuit breaker and backoff |
//! | [`metrics`] | Per-tool execution metrics |
//! | [`config`] | Service configuration and per-call options |
//! | [`telemetry`] | Execution event sinks and logging bootstrap |
//! | [`types`] | Core value types |

pub mod batch;
pub mod classify;
pub mod config;
pub mod error_code;
pub mod executor;
pub mod metrics;
pub mod registry;
pub mod resilience;
pub mod service;
pub mod telemetry;
pub mod types;

// Re-export main types for convenience
pub use batch::{validate_response_match, ResponseMatch};
pub use config::{ExecuteOptions, ToolExecutionConfig};
pub use error_code::ToolErrorCode;
pub use executor::{from_fn, ToolExecutor};
pub use metrics::ToolMetrics;
pub use registry::ToolRegistry;
pub use service::{default_service, ToolExecutionService};
pub use types::{ExecutionStatus, ToolCall, ToolError, ToolExecutionResult};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
