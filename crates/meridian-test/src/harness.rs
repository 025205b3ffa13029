//! Scripted-time test rig

use std::sync::Arc;
use std::time::Duration;

use meridian_core::{ManualTimeSource, Monotonic};
use meridian_stopwatch::StopwatchEngine;
use meridian_timer::TimerEngine;

/// All engines on one scripted source
///
/// `advance` plays the role of the host scheduler: move time, then tick.
/// Background suspension is modeled with `suspend_for`, which moves time
/// without ticking and then delivers the resume signal the way a host
/// lifecycle adapter would.
pub struct ScenarioClock {
    pub source: Arc<ManualTimeSource>,
    pub stopwatch: StopwatchEngine,
    pub timer: TimerEngine,
}

impl ScenarioClock {
    pub fn new() -> Self {
        // Away from zero so timer anchor shifts cannot saturate
        Self::starting_at(Monotonic::from_secs(1_000))
    }

    pub fn starting_at(at: Monotonic) -> Self {
        let source = Arc::new(ManualTimeSource::starting_at(at));
        ScenarioClock {
            stopwatch: StopwatchEngine::new(source.clone()),
            timer: TimerEngine::new(source.clone()),
            source,
        }
    }

    /// Advance scripted time and run one scheduler tick
    pub fn advance(&self, by: Duration) {
        self.source.advance(by);
        self.tick();
    }

    /// One scheduler tick without moving time
    pub fn tick(&self) {
        self.stopwatch.tick();
        self.timer.tick();
    }

    /// Model a background suspension: no ticks while time moves, then the
    /// resume signal with the measured gap
    pub fn suspend_for(&self, gap: Duration) {
        self.source.advance(gap);
        self.stopwatch.on_resume(gap);
        self.timer.on_resume(gap);
    }
}

impl Default for ScenarioClock {
    fn default() -> Self {
        Self::new()
    }
}
