//! 遥测模块：执行事件收集与日志初始化。
//!
//! Telemetry Module.
//!
//! Every execution is logged through `tracing`. Applications that need the
//! events programmatically (tests, audit trails, dashboards) attach an
//! [`ExecutionSink`] to the service.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ExecutionEvent`] | Typed execution event enum |
//! | [`ExecutionSink`] | Trait for event destinations |
//! | [`NoopExecutionSink`] | Default no-op sink |
//! | [`InMemoryExecutionSink`] | Bounded in-memory sink for testing |
//! | [`CompositeExecutionSink`] | Multi-destination composite sink |
//! | [`init_logging`] | Installs a `tracing-subscriber` fmt subscriber |

mod events;

pub(crate) use events::timestamp_ms;
pub use events::{
    noop_sink, AttemptFailed, AttemptStarted, CircuitRejected, Completed, ExecutionEvent,
    ExecutionSink, NoopExecutionSink,
};

use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tracing_subscriber::EnvFilter;

/// In-memory sink for testing.
pub struct InMemoryExecutionSink {
    events: RwLock<Vec<ExecutionEvent>>,
    max_events: usize,
}

impl InMemoryExecutionSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events: max,
        }
    }
    pub fn get_events(&self) -> Vec<ExecutionEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
    pub fn get_events_by_call(&self, call_id: &str) -> Vec<ExecutionEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.call_id() == call_id)
            .cloned()
            .collect()
    }
    pub fn get_events_by_tool(&self, tool_name: &str) -> Vec<ExecutionEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.tool_name() == tool_name)
            .cloned()
            .collect()
    }
    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ExecutionSink for InMemoryExecutionSink {
    async fn report(&self, event: ExecutionEvent) -> Result<()> {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
        Ok(())
    }
}

/// Composite sink for multiple destinations.
pub struct CompositeExecutionSink {
    sinks: Vec<Arc<dyn ExecutionSink>>,
}

impl CompositeExecutionSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }
    pub fn add_sink(mut self, sink: Arc<dyn ExecutionSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl Default for CompositeExecutionSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionSink for CompositeExecutionSink {
    async fn report(&self, event: ExecutionEvent) -> Result<()> {
        for s in &self.sinks {
            let _ = s.report(event.clone()).await;
        }
        Ok(())
    }
    async fn close(&self) -> Result<()> {
        for s in &self.sinks {
            let _ = s.close().await;
        }
        Ok(())
    }
}

/// Install a global fmt subscriber filtered by `RUST_LOG`, or by
/// `default_filter` when `RUST_LOG` is unset or invalid.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
