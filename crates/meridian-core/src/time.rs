//! Time primitives for the meridian engines
//!
//! Two time references coexist:
//! - Monotonic: strictly non-decreasing while the process lives, immune to
//!   wall-clock adjustments. All stopwatch/timer math uses this.
//! - Wall clock: chrono instants, estimated as system UTC plus a network
//!   offset while a sync sample is still trusted.

use std::ops::{Add, Sub};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Monotonic reading - microseconds since the owning source's epoch
/// INVARIANT: readings from one source never decrease
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Monotonic(pub u64);

impl Monotonic {
    pub const ZERO: Monotonic = Monotonic(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        Monotonic(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        Monotonic(millis * 1000)
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        Monotonic(secs * 1_000_000)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Monotonic(self.0.saturating_add(duration.as_micros() as u64))
    }

    #[inline]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        Monotonic(self.0.saturating_sub(duration.as_micros() as u64))
    }
}

impl Add<Duration> for Monotonic {
    type Output = Monotonic;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        Monotonic(self.0 + rhs.as_micros() as u64)
    }
}

impl Sub<Monotonic> for Monotonic {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Monotonic) -> Self::Output {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for Monotonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mono({:.3}s)", self.as_secs_f64())
    }
}

/// Where a wall-clock sample came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOrigin {
    /// Obtained from a remote time server
    Network,
    /// Fallback reading of the local system clock
    System,
}

/// An immutable wall-clock reading
#[derive(Clone, Copy, Debug)]
pub struct TimeSample {
    /// The wall-clock instant the sample carries
    pub utc: DateTime<Utc>,
    /// Source that produced the instant
    pub origin: SampleOrigin,
    /// Monotonic reading at capture
    pub captured_at: Monotonic,
}

impl TimeSample {
    pub fn network(utc: DateTime<Utc>, captured_at: Monotonic) -> Self {
        TimeSample {
            utc,
            origin: SampleOrigin::Network,
            captured_at,
        }
    }

    pub fn system(utc: DateTime<Utc>, captured_at: Monotonic) -> Self {
        TimeSample {
            utc,
            origin: SampleOrigin::System,
            captured_at,
        }
    }

    /// Signed correction of the sampled instant relative to a system reading
    #[inline]
    pub fn offset_from(&self, system_utc: DateTime<Utc>) -> chrono::Duration {
        self.utc - system_utc
    }
}

/// Offset state produced by successful network syncs
///
/// The offset is only trusted while `now < valid_until`; once expired,
/// wall-clock output silently reverts to the plain system clock.
#[derive(Clone, Copy, Debug)]
pub struct SyncState {
    /// Signed correction applied on top of the system UTC reading
    pub offset: chrono::Duration,
    /// Monotonic instant of the last successful sync
    pub last_sync: Monotonic,
    /// Monotonic instant at which the offset stops being trusted
    pub valid_until: Monotonic,
}

impl SyncState {
    pub fn new(offset: chrono::Duration, at: Monotonic, validity: Duration) -> Self {
        SyncState {
            offset,
            last_sync: at,
            valid_until: at.saturating_add(validity),
        }
    }

    /// Offset to apply at `now`, or `None` once the sample has expired
    #[inline]
    pub fn offset_at(&self, now: Monotonic) -> Option<chrono::Duration> {
        (now < self.valid_until).then_some(self.offset)
    }
}
