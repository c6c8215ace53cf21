//! 弹性模式模块：提供按工具熔断和指数退避等可靠性保障机制。
//!
//! # Resilience Primitives Module
//!
//! Failure isolation for tool calls.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`circuit_breaker`] | Per-tool circuit breaker for failure isolation |
//! | [`backoff`] | Exponential delay between retry attempts |
//!
//! ## Circuit Breaker
//!
//! Each tool name has its own circuit:
//! - **Closed**: Normal operation, calls pass through
//! - **Open**: Failures reached the threshold, calls fail fast
//! - **Half-Open**: Cooldown elapsed, one trial call tests recovery
//!
//! ```rust
//! use ai_tool_runtime::resilience::circuit_breaker::{
//!     CircuitBreakerConfig, CircuitBreakerRegistry,
//! };
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::new()
//!     .with_failure_threshold(5)
//!     .with_cooldown(Duration::from_secs(60));
//! let breakers = CircuitBreakerRegistry::new(config);
//!
//! if breakers.admit("weather_tool").is_allowed() {
//!     // Run the tool...
//!     breakers.on_success("weather_tool");
//! }
//! ```

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::Backoff;
pub use circuit_breaker::{
    Admission, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitBreakerSnapshot, CircuitState,
};
