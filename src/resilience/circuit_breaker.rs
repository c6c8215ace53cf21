use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerSnapshot {
    pub tool_name: String,
    pub state: CircuitState,
    pub failures: u32,
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the cooldown duration
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed, proceed normally.
    Allowed,
    /// Cooldown elapsed; this caller carries the single half-open trial.
    Trial,
    /// Circuit open; fail fast.
    Rejected { remaining: Option<Duration> },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Admission::Rejected { .. })
    }
}

#[derive(Debug, Default)]
struct ToolCircuit {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
    trial_started: Option<Instant>,
}

/// Per-tool circuit breaker.
///
/// - Counts failures per tool name; one misbehaving tool never affects another
/// - Opens once failures reach the threshold
/// - After the cooldown, admits exactly one half-open trial
/// - A success (or manual reset) closes the circuit and clears the count
///
/// A half-open trial whose outcome is never reported (the caller dropped the
/// future) expires after one cooldown, so the circuit cannot stay wedged.
pub struct CircuitBreakerRegistry {
    cfg: ArcSwap<CircuitBreakerConfig>,
    states: Mutex<HashMap<String, ToolCircuit>>,
}

impl CircuitBreakerRegistry {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg: ArcSwap::from_pointee(cfg),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> CircuitBreakerConfig {
        self.cfg.load().as_ref().clone()
    }

    /// Replace thresholds; existing per-tool state is kept.
    pub fn set_config(&self, cfg: CircuitBreakerConfig) {
        self.cfg.store(Arc::new(cfg));
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ToolCircuit>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn admit(&self, tool_name: &str) -> Admission {
        let cooldown = self.cfg.load().cooldown;
        let mut states = self.lock();
        let Some(circuit) = states.get_mut(tool_name) else {
            return Admission::Allowed;
        };
        let now = Instant::now();

        match circuit.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let elapsed = circuit
                    .last_failure
                    .map(|t| now.duration_since(t))
                    .unwrap_or(cooldown);
                if elapsed >= cooldown {
                    circuit.state = CircuitState::HalfOpen;
                    circuit.trial_started = Some(now);
                    Admission::Trial
                } else {
                    Admission::Rejected {
                        remaining: Some(cooldown - elapsed),
                    }
                }
            }
            CircuitState::HalfOpen => match circuit.trial_started {
                Some(started) if now.duration_since(started) < cooldown => Admission::Rejected {
                    remaining: None,
                },
                _ => {
                    circuit.trial_started = Some(now);
                    Admission::Trial
                }
            },
        }
    }

    pub fn on_success(&self, tool_name: &str) {
        let mut states = self.lock();
        if let Some(circuit) = states.get_mut(tool_name) {
            *circuit = ToolCircuit::default();
        }
    }

    /// Record a failure; returns the resulting state.
    pub fn on_failure(&self, tool_name: &str) -> CircuitState {
        let threshold = self.cfg.load().failure_threshold;
        let mut states = self.lock();
        let circuit = states.entry(tool_name.to_string()).or_default();
        circuit.failures = circuit.failures.saturating_add(1);
        circuit.last_failure = Some(Instant::now());
        circuit.trial_started = None;
        if circuit.failures >= threshold {
            circuit.state = CircuitState::Open;
        }
        circuit.state
    }

    /// Force the circuit closed with a zero failure count.
    pub fn reset(&self, tool_name: &str) {
        self.lock()
            .insert(tool_name.to_string(), ToolCircuit::default());
    }

    pub fn snapshot(&self, tool_name: &str) -> CircuitBreakerSnapshot {
        let cfg = self.cfg.load();
        let states = self.lock();
        let (state, failures, open_remaining_ms) = match states.get(tool_name) {
            Some(circuit) => {
                let remaining = match (circuit.state, circuit.last_failure) {
                    (CircuitState::Open, Some(last)) => cfg
                        .cooldown
                        .checked_sub(last.elapsed())
                        .filter(|d| !d.is_zero())
                        .map(|d| d.as_millis() as u64),
                    _ => None,
                };
                (circuit.state, circuit.failures, remaining)
            }
            None => (CircuitState::Closed, 0, None),
        };
        CircuitBreakerSnapshot {
            tool_name: tool_name.to_string(),
            state,
            failures,
            failure_threshold: cfg.failure_threshold,
            cooldown_ms: cfg.cooldown.as_millis() as u64,
            open_remaining_ms,
        }
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
