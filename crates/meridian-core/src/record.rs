//! State records published by the stopwatch and timer engines

use std::time::Duration;

/// A recorded lap
///
/// `split` is the time since the previous lap (or since start for the first
/// lap); `cumulative` is the time since the stopwatch started. Within one
/// run, cumulative readings never decrease and the splits up to lap `k` sum
/// to lap `k`'s cumulative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LapRecord {
    /// 1-based index, increasing within a run
    pub index: u32,
    /// Time since the previous lap
    pub split: Duration,
    /// Time since the stopwatch started
    pub cumulative: Duration,
}

/// Discrete state of the timer engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimerPhase {
    /// Disarmed; no countdown in progress
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Frozen mid-countdown
    Paused,
    /// Countdown reached zero; re-armed only by a new start
    Completed,
}
