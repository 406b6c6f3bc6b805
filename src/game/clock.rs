//! Game clocks
//!
//! The orchestrator reads game time through [`GameClock`] so tests can drive
//! ticks deterministically with a [`ManualClock`] while the binary runs on a
//! [`MonotonicClock`].

use crate::game::types::Millis;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use web_time::Instant;

/// Source of game time
pub trait GameClock: Send {
    /// Milliseconds since the game clock started
    fn now_ms(&self) -> Millis;

    /// Pause between ticks
    fn wait(&self, interval_ms: Millis);
}

/// Wall-clock time scaled by a speed factor
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
    time_factor: u64,
}

impl MonotonicClock {
    pub fn new(time_factor: u64) -> Self {
        Self {
            start: Instant::now(),
            time_factor: time_factor.max(1),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl GameClock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        let elapsed = self.start.elapsed().as_millis() as Millis;
        elapsed.saturating_mul(self.time_factor)
    }

    fn wait(&self, interval_ms: Millis) {
        std::thread::sleep(Duration::from_millis(interval_ms));
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep a handle while the
/// orchestrator owns another. `wait` advances time by the interval.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: Millis) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: Millis) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl GameClock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }

    fn wait(&self, interval_ms: Millis) {
        self.advance(interval_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now_ms(), 150);

        clock.wait(16);
        assert_eq!(handle.now_ms(), 166);

        handle.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new(10);
        let first = clock.now_ms();
        clock.wait(2);
        assert!(clock.now_ms() >= first + 10, "time factor scales elapsed time");
    }
}
