//! Per-provider circuit breaker.
//!
//! After repeated failures a provider's circuit opens and the orchestrator
//! skips it, going straight to the next provider. Once the recovery timeout
//! has passed the circuit lets calls through again (half-open) and closes
//! after enough consecutive successes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,

    /// Time before a trial call is allowed (in seconds)
    #[serde(with = "duration_secs")]
    pub recovery_timeout: Duration,

    /// Half-open successes needed to close the circuit
    pub success_threshold: u32,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of one provider's circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Calls skip the provider
    Open { opened_at: Instant },

    /// Trial calls allowed
    HalfOpen { successes: u32 },
}

impl CircuitState {
    pub fn name(&self) -> &'static str {
        match self {
            CircuitState::Closed { .. } => "closed",
            CircuitState::Open { .. } => "open",
            CircuitState::HalfOpen { .. } => "half_open",
        }
    }
}

/// Circuit breaker keyed by provider name.
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls to `provider` should be skipped right now.
    ///
    /// An open circuit whose recovery timeout has elapsed moves to
    /// half-open and reports closed.
    pub fn is_open(&self, provider: &str) -> bool {
        let mut states = self.states.write();
        let Some(state) = states.get_mut(provider) else {
            return false;
        };

        match state {
            CircuitState::Open { opened_at } => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    *state = CircuitState::HalfOpen { successes: 0 };
                    tracing::info!(provider, "Circuit half-open, allowing trial call");
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, provider: &str) {
        let mut states = self.states.write();
        let next = match states.get(provider) {
            Some(CircuitState::HalfOpen { successes })
                if successes + 1 < self.config.success_threshold =>
            {
                CircuitState::HalfOpen {
                    successes: successes + 1,
                }
            }
            Some(CircuitState::HalfOpen { .. }) => {
                tracing::info!(provider, "Circuit closed after successful recovery");
                CircuitState::Closed { failures: 0 }
            }
            Some(CircuitState::Open { opened_at }) => CircuitState::Open {
                opened_at: *opened_at,
            },
            _ => CircuitState::Closed { failures: 0 },
        };
        states.insert(provider.to_string(), next);
    }

    /// Record a failed call.
    pub fn record_failure(&self, provider: &str) {
        let mut states = self.states.write();
        let next = match states.get(provider) {
            Some(CircuitState::HalfOpen { .. }) => {
                tracing::warn!(provider, "Circuit reopened after failed recovery attempt");
                CircuitState::Open {
                    opened_at: Instant::now(),
                }
            }
            Some(CircuitState::Open { opened_at }) => CircuitState::Open {
                opened_at: *opened_at,
            },
            Some(CircuitState::Closed { failures }) => self.after_failure(provider, failures + 1),
            None => self.after_failure(provider, 1),
        };
        states.insert(provider.to_string(), next);
    }

    fn after_failure(&self, provider: &str, failures: u32) -> CircuitState {
        if failures >= self.config.failure_threshold {
            tracing::warn!(provider, failures, "Circuit opened after repeated failures");
            CircuitState::Open {
                opened_at: Instant::now(),
            }
        } else {
            CircuitState::Closed { failures }
        }
    }

    /// Current state of a provider's circuit.
    pub fn state(&self, provider: &str) -> CircuitState {
        self.states
            .read()
            .get(provider)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Reset all circuits to closed.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
