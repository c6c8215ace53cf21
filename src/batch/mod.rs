//! 批处理模块：批量工具调用的响应校验。
//!
//! # Batch Module
//!
//! Agent protocols answer a batch of tool calls with exactly one result per
//! call, in call order. A count or order mismatch there surfaces upstream as
//! a rejected request, so every batch is checked before it is handed back.
//!
//! ## Example
//!
//! ```rust
//! use ai_tool_runtime::batch::validate_response_match;
//! use ai_tool_runtime::types::{ToolCall, ToolExecutionResult};
//!
//! let calls: Vec<ToolCall> = Vec::new();
//! let results: Vec<ToolExecutionResult> = Vec::new();
//! assert!(validate_response_match(&calls, &results).valid);
//! ```

mod validation;

pub use validation::{validate_response_match, ResponseMatch};
