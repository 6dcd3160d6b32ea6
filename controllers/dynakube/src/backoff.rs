//! # Requeue Backoff
//!
//! Fibonacci backoff for failed DynaKube reconciliations, tracked per resource.
//! Grows more slowly than exponential backoff, so a tenant outage does not push
//! the next version check out by hours.
//!
//! Default sequence: 1m, 1m, 2m, 3m, 5m, 8m, 10m (max).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Fibonacci backoff calculator
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min: Duration,
    prev: Duration,
    current: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    /// Create a new backoff starting at `min` and capped at `max`
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev + self.current;
        self.prev = self.current;
        self.current = next.min(self.max);
        result
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev = Duration::ZERO;
        self.current = self.min;
    }
}

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Per-resource backoff, keyed by `namespace/name`.
#[derive(Debug)]
pub struct BackoffStates {
    min: Duration,
    max: Duration,
    states: Mutex<HashMap<String, BackoffState>>,
}

impl Default for BackoffStates {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(600))
    }
}

impl BackoffStates {
    /// Creates an empty tracker with the given delay bounds.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Records a failure and returns how long to wait before retrying,
    /// together with the number of consecutive failures.
    pub fn record_error(&self, key: &str) -> (Duration, u32) {
        let mut states = match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let state = states.entry(key.to_string()).or_insert_with(|| BackoffState {
            backoff: FibonacciBackoff::new(self.min, self.max),
            error_count: 0,
        });
        state.error_count += 1;
        (state.backoff.next_backoff(), state.error_count)
    }

    /// Forgets the failure history of a resource after a clean pass.
    pub fn reset(&self, key: &str) {
        let mut states = match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(state) = states.get_mut(key) {
            state.error_count = 0;
            state.backoff.reset();
        }
    }
}
