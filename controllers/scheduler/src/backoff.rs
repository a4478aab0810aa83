//! # Fibonacci Backoff
//!
//! Requeue delays for reconciliations that fail outright (store unreachable,
//! status write conflict, cancellation). Passes that complete with per-entry
//! errors use the fixed requeue delay instead.
//!
//! Sequence with the controller defaults: 5s, 5s, 10s, 15s, 25s, 40s, 65s,
//! 105s, 170s, 275s, 300s (max).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, starting from `min` twice and
/// capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min: Duration,
    prev: Duration,
    current: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Returns the current delay and advances the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = next.min(self.max);
        result
    }

    /// Restart the sequence from `min`
    pub fn reset(&mut self) {
        self.prev = Duration::ZERO;
        self.current = self.min;
    }
}

/// Per-Scheduler backoff state, keyed by `namespace/name`
#[derive(Debug)]
pub struct BackoffTracker {
    min: Duration,
    max: Duration,
    states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl BackoffTracker {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Next delay for a resource that just failed
    pub fn next_for(&self, resource_key: &str) -> Duration {
        match self.states.lock() {
            Ok(mut states) => states
                .entry(resource_key.to_string())
                .or_insert_with(|| FibonacciBackoff::new(self.min, self.max))
                .next_backoff(),
            Err(_) => self.min,
        }
    }

    /// Forget the failure history of a resource after a successful pass
    pub fn reset(&self, resource_key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(resource_key);
        }
    }
}

impl Default for BackoffTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(secs(5), secs(300));
        let seq: Vec<u64> = (0..11).map(|_| backoff.next_backoff().as_secs()).collect();
        assert_eq!(seq, vec![5, 5, 10, 15, 25, 40, 65, 105, 170, 275, 300]);
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(secs(1), secs(3));
        let seq: Vec<u64> = (0..6).map(|_| backoff.next_backoff().as_secs()).collect();
        assert_eq!(seq, vec![1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(secs(5), secs(300));
        backoff.next_backoff();
        backoff.next_backoff();
        backoff.next_backoff();

        backoff.reset();

        assert_eq!(backoff.next_backoff(), secs(5));
        assert_eq!(backoff.next_backoff(), secs(5));
        assert_eq!(backoff.next_backoff(), secs(10));
    }

    #[test]
    fn test_tracker_is_per_resource() {
        let tracker = BackoffTracker::default();
        assert_eq!(tracker.next_for("ns/a"), secs(5));
        assert_eq!(tracker.next_for("ns/a"), secs(5));
        assert_eq!(tracker.next_for("ns/a"), secs(10));
        assert_eq!(tracker.next_for("ns/b"), secs(5));

        tracker.reset("ns/a");
        assert_eq!(tracker.next_for("ns/a"), secs(5));
    }
}
