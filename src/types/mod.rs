//! 类型系统模块：定义工具调用与执行结果的核心数据类型。
//!
//! # Types Module
//!
//! Core value types shared by the executor seam, the service and the agent
//! loop that consumes results.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ToolCall`] | A named invocation request with a correlation id |
//! | [`ToolExecutionResult`] | The single outcome produced for every call |
//! | [`ToolError`] | Classified failure with raw and user-facing messages |
//! | [`ExecutionStatus`] | `success`, `error` or `timeout` |
//! | [`ToolDefinition`] | Tool definition (name, description, JSON Schema) |
//! | [`ToolResult`] | Protocol message answering a tool call |
//!
//! ## Example
//!
//! ```rust
//! use ai_tool_runtime::types::ToolCall;
//!
//! let call = ToolCall::with_id("call_1", "get_weather", Default::default())
//!     .with_parameter("city", serde_json::json!("Paris"));
//! assert_eq!(call.parameters["city"], "Paris");
//! ```

pub mod execution;
pub mod tool;

pub use execution::{ExecutionStatus, ToolError, ToolExecutionResult};
pub use tool::{FunctionDefinition, ToolCall, ToolDefinition, ToolResult};
