// Process-wide circuit breaker guarding the LLM Gateway's vendor calls.
//
// Grounded on this workspace's existing reliability primitives
// (`durable::reliability::circuit_breaker` and `distributed_circuit_breaker`),
// simplified to a single in-process atomic-state object: the spec treats
// the breaker as "process-wide shared object with a small amount of atomic
// state", so the Postgres-backed distributed variant is not carried over.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AriaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
        }
    }
}

/// `CLOSED -> OPEN` on `failure_threshold` consecutive failures.
/// `OPEN -> HALF_OPEN` after `reset_timeout` has elapsed.
/// `HALF_OPEN -> CLOSED` on `success_threshold` consecutive probe successes.
/// `HALF_OPEN -> OPEN` on any probe failure.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: AtomicU32, // 0 = closed, 1 = open, 2 = half_open
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
    opened_at_ms: AtomicU64,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: AtomicU32::new(0),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            opened_at_ms: AtomicU64::new(0),
        })
    }

    pub fn state(&self) -> CircuitState {
        match self.state.load(Ordering::SeqCst) {
            1 => {
                let elapsed = now_ms().saturating_sub(self.opened_at_ms.load(Ordering::SeqCst));
                if elapsed >= self.config.reset_timeout_ms {
                    CircuitState::HalfOpen
                } else {
                    CircuitState::Open
                }
            }
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    /// Acquire a permit to perform the guarded call, or `CircuitOpen` if
    /// the breaker is currently tripped.
    pub fn acquire(&self) -> Result<CircuitBreakerPermit<'_>> {
        match self.state() {
            CircuitState::Open => Err(AriaError::circuit_open("llm gateway circuit is open")),
            CircuitState::HalfOpen => {
                // Transition the stored state so concurrent callers see
                // half-open too, then allow exactly this probe through.
                self.state.store(2, Ordering::SeqCst);
                Ok(CircuitBreakerPermit { breaker: self })
            }
            CircuitState::Closed => Ok(CircuitBreakerPermit { breaker: self }),
        }
    }

    fn on_success(&self) {
        match self.state() {
            CircuitState::HalfOpen => {
                let successes = self.consecutive_successes.fetch_add(1, Ordering::SeqCst) + 1;
                if successes >= self.config.success_threshold {
                    self.close();
                }
            }
            _ => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
            }
        }
    }

    fn on_failure(&self) {
        match self.state() {
            CircuitState::HalfOpen => self.open(),
            _ => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.config.failure_threshold {
                    self.open();
                }
            }
        }
    }

    fn open(&self) {
        self.state.store(1, Ordering::SeqCst);
        self.opened_at_ms.store(now_ms(), Ordering::SeqCst);
        self.consecutive_successes.store(0, Ordering::SeqCst);
    }

    fn close(&self) {
        self.state.store(0, Ordering::SeqCst);
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.consecutive_successes.store(0, Ordering::SeqCst);
    }
}

/// Acquired once per guarded call; the caller must report the outcome.
pub struct CircuitBreakerPermit<'a> {
    breaker: &'a CircuitBreaker,
}

impl<'a> CircuitBreakerPermit<'a> {
    pub fn success(self) {
        self.breaker.on_success();
    }

    pub fn failure(self) {
        self.breaker.on_failure();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_failure_threshold() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            ..Default::default()
        });
        for _ in 0..3 {
            cb.acquire().unwrap().failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.acquire().is_err());
    }

    #[test]
    fn half_open_success_closes_circuit() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 1,
            reset_timeout_ms: 0,
        });
        cb.acquire().unwrap().failure();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.acquire().unwrap().success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 2,
            reset_timeout_ms: 0,
        });
        cb.acquire().unwrap().failure();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.acquire().unwrap().failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
