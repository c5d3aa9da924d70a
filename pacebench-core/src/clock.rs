//! Timing
//!
//! Every measurement goes through a [`Clock`]: an opaque monotonic tick
//! counter plus conversions to and from milliseconds. The engine only ever
//! subtracts two readings of the same clock, so ticks need no fixed unit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Monotonic tick source used for all sample and budget measurements
pub trait Clock: Send + Sync {
    /// Name of the timestamp provider, reported with each measurement
    fn name(&self) -> &str;

    /// Current reading in provider ticks
    fn now(&self) -> u64;

    /// Convert a tick delta to milliseconds
    fn to_ms(&self, ticks: u64) -> f64;

    /// Convert milliseconds to a tick delta
    fn from_ms(&self, ms: f64) -> u64;

    /// Milliseconds elapsed since `start`
    #[inline]
    fn elapsed_ms(&self, start: u64) -> f64 {
        self.to_ms(self.now().saturating_sub(start))
    }
}

// ─── InstantClock ────────────────────────────────────────────────────────────

/// Nanosecond ticks from `std::time::Instant`, counted from construction
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: std::time::Instant,
}

impl InstantClock {
    /// Start a clock at the current instant
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for InstantClock {
    fn name(&self) -> &str {
        "instant"
    }

    #[inline(always)]
    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    #[inline(always)]
    fn to_ms(&self, ticks: u64) -> f64 {
        ticks as f64 / 1e6
    }

    #[inline(always)]
    fn from_ms(&self, ms: f64) -> u64 {
        (ms.max(0.0) * 1e6).round() as u64
    }
}

// ─── ManualClock ─────────────────────────────────────────────────────────────

/// A clock that only moves when told to.
///
/// Ticks are nanoseconds. Benchmark bodies can advance it to produce exact,
/// reproducible samples.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.ticks.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move the clock forward by a (possibly fractional) number of milliseconds
    pub fn advance_ms(&self, ms: f64) {
        self.ticks.fetch_add(self.from_ms(ms), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn name(&self) -> &str {
        "manual"
    }

    fn now(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn to_ms(&self, ticks: u64) -> f64 {
        ticks as f64 / 1e6
    }

    fn from_ms(&self, ms: f64) -> u64 {
        (ms.max(0.0) * 1e6).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_clock_elapsed() {
        let clock = InstantClock::new();
        let start = clock.now();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = clock.elapsed_ms(start);

        // Should be at least 10ms
        assert!(elapsed >= 10.0);
        // Should be well under a second (accounting for scheduling)
        assert!(elapsed < 1000.0);
    }

    #[test]
    fn test_instant_clock_monotonic() {
        let clock = InstantClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a, "clock should be monotonic");
        assert_eq!(clock.name(), "instant");
    }

    #[test]
    fn test_conversions() {
        let clock = InstantClock::new();
        assert_eq!(clock.from_ms(1.5), 1_500_000);
        assert_eq!(clock.to_ms(2_500_000), 2.5);
        assert_eq!(clock.from_ms(-3.0), 0);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), 0);

        clock.advance(Duration::from_millis(3));
        clock.advance_ms(0.25);

        assert_eq!(clock.now(), 3_250_000);
        assert_eq!(clock.elapsed_ms(0), 3.25);
        assert_eq!(clock.name(), "manual");
    }
}
