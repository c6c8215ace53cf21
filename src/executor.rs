//! Executor seam: the caller-supplied implementation behind a tool name.

use crate::types::ToolCall;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Runs a tool call.
///
/// Return `Value::Null` when the tool has nothing to return; that is still a
/// success. Errors may be any `anyhow::Error`; wrap a
/// [`ToolError`](crate::types::ToolError) to pre-classify the failure.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> anyhow::Result<Value>;
}

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn execute(&self, call: &ToolCall) -> anyhow::Result<Value> {
        (**self).execute(call).await
    }
}

#[async_trait]
impl<'a, T: ToolExecutor + ?Sized> ToolExecutor for &'a T {
    async fn execute(&self, call: &ToolCall) -> anyhow::Result<Value> {
        (**self).execute(call).await
    }
}

/// Closure adapter returned by [`from_fn`].
pub struct FnExecutor<F> {
    f: F,
}

/// Adapt an async closure taking an owned [`ToolCall`] into a [`ToolExecutor`].
///
/// ```rust
/// use ai_tool_runtime::executor::from_fn;
/// use ai_tool_runtime::types::ToolCall;
///
/// let echo = from_fn(|call: ToolCall| async move {
///     Ok::<_, anyhow::Error>(serde_json::Value::Object(call.parameters))
/// });
/// # let _ = echo;
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnExecutor<F>
where
    F: Fn(ToolCall) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    FnExecutor { f }
}

#[async_trait]
impl<F, Fut> ToolExecutor for FnExecutor<F>
where
    F: Fn(ToolCall) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn execute(&self, call: &ToolCall) -> anyhow::Result<Value> {
        (self.f)(call.clone()).await
    }
}
