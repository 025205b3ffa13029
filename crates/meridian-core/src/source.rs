//! Monotonic time sources

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::Monotonic;

/// Supplier of strictly non-decreasing elapsed-time readings
///
/// Implementations never step backwards and are unaffected by wall-clock
/// adjustments (user edits, NTP steps, timezone changes). Large forward
/// jumps between two readings are plausible - the process may have been
/// suspended in between - and callers compensate for them explicitly.
pub trait TimeSource: Send + Sync {
    /// Current monotonic reading
    fn now(&self) -> Monotonic;
}

/// Monotonic source backed by the OS clock
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Create a source anchored at the current instant
    pub fn new() -> Self {
        SystemTimeSource {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Monotonic {
        Monotonic::from_micros(self.origin.elapsed().as_micros() as u64)
    }
}

/// Scripted monotonic source for tests and simulation
pub struct ManualTimeSource {
    current: Mutex<Monotonic>,
}

impl ManualTimeSource {
    /// Create a source reading zero
    pub fn new() -> Self {
        Self::starting_at(Monotonic::ZERO)
    }

    /// Create a source with a chosen initial reading
    pub fn starting_at(at: Monotonic) -> Self {
        ManualTimeSource {
            current: Mutex::new(at),
        }
    }

    /// Move the reading forward
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current = current.saturating_add(by);
    }

    /// Jump to a reading; backwards moves are ignored
    pub fn set(&self, to: Monotonic) {
        let mut current = self.current.lock();
        *current = (*current).max(to);
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Monotonic {
        *self.current.lock()
    }
}
