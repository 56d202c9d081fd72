use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use configs::CircuitBreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u64,
    half_open_successes: u64,
    half_open_in_flight: u64,
    opened_at: Option<Instant>,
    /// Last time a half-open trial was admitted.
    trial_admitted_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy)]
struct Thresholds {
    failure_threshold: u64,
    recovery_timeout: Duration,
    half_open_max_calls: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            half_open_successes: 0,
            half_open_in_flight: 0,
            opened_at: None,
            trial_admitted_at: None,
        }
    }

    fn try_acquire(&mut self, t: &Thresholds) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = self.opened_at.map(|at| at.elapsed() >= t.recovery_timeout).unwrap_or(false);
                if elapsed {
                    info!(event = "circuit_half_open", "circuit breaker probing upstream");
                    self.state = CircuitState::HalfOpen;
                    self.half_open_successes = 0;
                    self.half_open_in_flight = 1;
                    self.trial_admitted_at = Some(Instant::now());
                    true
                } else {
                    debug!(event = "circuit_reject", "circuit breaker open");
                    false
                }
            }
            CircuitState::HalfOpen => {
                if self.half_open_in_flight < t.half_open_max_calls {
                    self.half_open_in_flight += 1;
                    self.trial_admitted_at = Some(Instant::now());
                    return true;
                }
                // Trials whose callers went away never report back; reclaim their slots.
                let stale = self.trial_admitted_at.map_or(true, |at| at.elapsed() >= t.recovery_timeout);
                if stale {
                    warn!(event = "circuit_trial_stale", in_flight = self.half_open_in_flight, "reclaiming half-open trial slots");
                    self.half_open_in_flight = 1;
                    self.trial_admitted_at = Some(Instant::now());
                }
                stale
            }
        }
    }

    fn on_success(&mut self, t: &Thresholds) {
        match self.state {
            CircuitState::Closed => self.failures = 0,
            CircuitState::HalfOpen => {
                self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
                self.half_open_successes += 1;
                if self.half_open_successes >= t.half_open_max_calls {
                    info!(event = "circuit_closed", "circuit breaker closed after recovery");
                    *self = BreakerState::new();
                }
            }
            // a call admitted before the breaker tripped
            CircuitState::Open => {}
        }
    }

    fn on_failure(&mut self, t: &Thresholds) {
        self.failures += 1;
        match self.state {
            CircuitState::Closed if self.failures >= t.failure_threshold => {
                warn!(event = "circuit_open", failures = self.failures, "circuit breaker opened");
                self.trip();
            }
            CircuitState::Closed => {}
            CircuitState::HalfOpen => {
                warn!(event = "circuit_open", "trial failed, circuit breaker reopened");
                self.trip();
            }
            CircuitState::Open => self.opened_at = Some(Instant::now()),
        }
    }

    fn trip(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.half_open_successes = 0;
        self.half_open_in_flight = 0;
        self.trial_admitted_at = None;
    }
}

/// Closed → Open after `failure_threshold` consecutive failures; Open → HalfOpen
/// once `recovery_timeout` has passed; HalfOpen admits up to `half_open_max_calls`
/// trials and closes when that many succeed. Trial slots not reported back within
/// `recovery_timeout` are handed out again.
#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Mutex<BreakerState>>,
    thresholds: Thresholds,
    enabled: bool,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u64, recovery_timeout: Duration, half_open_max_calls: u64, enabled: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BreakerState::new())),
            thresholds: Thresholds {
                failure_threshold: failure_threshold.max(1),
                recovery_timeout,
                half_open_max_calls: half_open_max_calls.max(1),
            },
            enabled,
        }
    }

    pub fn from_config(cfg: &CircuitBreakerConfig) -> Self {
        Self::new(
            cfg.failure_threshold,
            Duration::from_secs(cfg.recovery_timeout_secs),
            cfg.half_open_max_calls,
            cfg.enabled,
        )
    }

    pub async fn can_execute(&self) -> bool {
        if !self.enabled {
            return true;
        }
        self.inner.lock().await.try_acquire(&self.thresholds)
    }

    pub async fn record_success(&self) {
        if !self.enabled {
            return;
        }
        self.inner.lock().await.on_success(&self.thresholds);
    }

    pub async fn record_failure(&self) {
        if !self.enabled {
            return;
        }
        self.inner.lock().await.on_failure(&self.thresholds);
    }

    pub async fn state(&self) -> CircuitState {
        if !self.enabled {
            return CircuitState::Closed;
        }
        self.inner.lock().await.state
    }
}
