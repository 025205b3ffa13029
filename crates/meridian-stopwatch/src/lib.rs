//! Meridian Stopwatch - Elapsed-time tracking with lap history
//!
//! The stopwatch measures against the monotonic source only, so wall-clock
//! steps never bend a run. Pause gaps are accumulated and subtracted from
//! the anchor distance; elapsed is frozen while stopped and immune to the
//! pause/resume cycle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use meridian_core::{LapRecord, Monotonic, Property, Signal, TimeSource};

/// Stopwatch configuration
#[derive(Clone, Debug)]
pub struct StopwatchConfig {
    /// Bound on retained lap history; the oldest entry is evicted first
    pub lap_capacity: usize,
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        StopwatchConfig { lap_capacity: 100 }
    }
}

/// Stopwatch engine
///
/// Single writer: all mutation goes through the engine's operations, driven
/// by the host scheduler's tick while running.
pub struct StopwatchEngine {
    time: Arc<dyn TimeSource>,
    config: StopwatchConfig,
    inner: Mutex<StopwatchInner>,
    elapsed: Property<Duration>,
    running: Property<bool>,
    laps: Property<Vec<LapRecord>>,
    lap_recorded: Signal<LapRecord>,
}

#[derive(Default)]
struct StopwatchInner {
    /// Monotonic instant the current run began
    anchor: Option<Monotonic>,
    /// Instant of the most recent stop, while the run is suspended
    paused_at: Option<Monotonic>,
    /// Total time spent paused within the current run
    paused_total: Duration,
    lap_index: u32,
}

impl StopwatchEngine {
    /// Create a stopwatch with the default lap bound
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self::with_config(time, StopwatchConfig::default())
    }

    /// Create a stopwatch with custom configuration
    pub fn with_config(time: Arc<dyn TimeSource>, config: StopwatchConfig) -> Self {
        StopwatchEngine {
            time,
            config,
            inner: Mutex::new(StopwatchInner::default()),
            elapsed: Property::new(Duration::ZERO),
            running: Property::new(false),
            laps: Property::new(Vec::new()),
            lap_recorded: Signal::new(),
        }
    }

    /// Elapsed time of the current run
    pub fn elapsed(&self) -> &Property<Duration> {
        &self.elapsed
    }

    /// Whether the stopwatch is running
    pub fn running(&self) -> &Property<bool> {
        &self.running
    }

    /// Recorded laps, oldest first
    pub fn laps(&self) -> &Property<Vec<LapRecord>> {
        &self.laps
    }

    /// Fires once per recorded lap
    pub fn lap_recorded(&self) -> &Signal<LapRecord> {
        &self.lap_recorded
    }

    /// Start a fresh run, or resume a paused one
    ///
    /// No-op if already running.
    pub fn start(&self) {
        if self.running.get() {
            return;
        }

        let now = self.time.now();
        {
            let mut inner = self.inner.lock();
            if self.elapsed.get() == Duration::ZERO {
                // Fresh run
                inner.anchor = Some(now);
                inner.paused_at = None;
                inner.paused_total = Duration::ZERO;
                inner.lap_index = 0;
            } else if let Some(paused_at) = inner.paused_at.take() {
                inner.paused_total += now - paused_at;
            }
        }
        self.running.set(true);
    }

    /// Pause the run, freezing elapsed at the stop instant
    ///
    /// No-op if not running.
    pub fn stop(&self) {
        if !self.running.get() {
            return;
        }

        self.inner.lock().paused_at = Some(self.time.now());
        self.running.set(false);
        self.recompute();
    }

    /// Return to zero and clear the lap history
    pub fn reset(&self) {
        *self.inner.lock() = StopwatchInner::default();
        self.running.set(false);
        self.elapsed.set(Duration::ZERO);
        self.laps.set(Vec::new());
    }

    /// Record a lap at the current elapsed reading
    ///
    /// No-op while stopped or before the run has moved off zero.
    pub fn record_lap(&self) {
        if !self.running.get() {
            return;
        }

        let elapsed = self.recompute();
        if elapsed == Duration::ZERO {
            return;
        }

        let index = {
            let mut inner = self.inner.lock();
            inner.lap_index += 1;
            inner.lap_index
        };

        let mut laps = self.laps.get();
        let previous = laps.last().map(|lap| lap.cumulative).unwrap_or(Duration::ZERO);
        let record = LapRecord {
            index,
            split: elapsed.saturating_sub(previous),
            cumulative: elapsed,
        };

        laps.push(record);
        if laps.len() > self.config.lap_capacity {
            laps.remove(0);
        }

        self.laps.set(laps);
        self.lap_recorded.emit(&record);
    }

    /// Scheduler tick: refresh elapsed while running
    pub fn tick(&self) {
        if self.running.get() {
            self.recompute();
        }
    }

    /// Resume-from-background: publish the suspended interval immediately
    /// instead of waiting for the next tick
    pub fn on_resume(&self, _gap: Duration) {
        if self.running.get() {
            self.recompute();
        }
    }

    fn recompute(&self) -> Duration {
        let elapsed = {
            let inner = self.inner.lock();
            let Some(anchor) = inner.anchor else {
                return Duration::ZERO;
            };
            // Monotonic subtraction clamps at zero on source irregularities
            (self.time.now() - anchor).saturating_sub(inner.paused_total)
        };
        self.elapsed.set(elapsed);
        elapsed
    }
}
