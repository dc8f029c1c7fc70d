//! Elapsed-time sources.
//!
//! The host environment supplies milliseconds since boot; everything in the
//! logger that needs a timestamp goes through [`TimeSource`] so tests and
//! simulation can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Supplier of elapsed milliseconds since program start.
pub trait TimeSource: Send + Sync {
    /// Milliseconds elapsed since boot (or since this source was created).
    fn millis(&self) -> u64;
}

/// Production time source backed by a monotonic [`Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose zero point is now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Manually advanced time source for tests and simulation.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock at zero milliseconds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }

    /// Sets the clock to an absolute millisecond value.
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn millis(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

/// Renders elapsed milliseconds as zero-padded seconds, `SSSS.mmm`.
///
/// This is the first column of every data row and the leading field of every
/// message header.
pub(crate) fn stamp(millis: u64) -> String {
    format!("{:08.3}", millis as f64 / 1000.0)
}
