//! Meridian Timer - Countdown state machine
//!
//! Phases move `Idle -> Running -> {Paused <-> Running} -> Completed`;
//! stop and reset return to `Idle` from anywhere. The completion signal
//! fires exactly once per run: the tick that reaches zero also leaves the
//! `Running` phase, and no later tick, stop, or reset can re-emit it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use meridian_core::{Monotonic, Property, Signal, TimeSource, TimerPhase};

/// Countdown timer engine
///
/// Single writer: all mutation goes through the engine's operations, driven
/// by the host scheduler's tick while running.
pub struct TimerEngine {
    time: Arc<dyn TimeSource>,
    inner: Mutex<TimerInner>,
    remaining: Property<Duration>,
    phase: Property<TimerPhase>,
    completed: Signal<()>,
}

#[derive(Default)]
struct TimerInner {
    /// Countdown target
    duration: Duration,
    /// Monotonic instant the countdown is measured from
    anchor: Option<Monotonic>,
    /// Elapsed-at-pause, so a resume continues where the pause froze
    paused_offset: Duration,
}

impl TimerEngine {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        TimerEngine {
            time,
            inner: Mutex::new(TimerInner::default()),
            remaining: Property::new(Duration::ZERO),
            phase: Property::new(TimerPhase::Idle),
            completed: Signal::new(),
        }
    }

    /// Time left in the countdown
    pub fn remaining(&self) -> &Property<Duration> {
        &self.remaining
    }

    /// Current phase of the state machine
    pub fn phase(&self) -> &Property<TimerPhase> {
        &self.phase
    }

    /// Fires once when a run reaches zero
    pub fn completed(&self) -> &Signal<()> {
        &self.completed
    }

    /// Countdown target currently set
    pub fn duration(&self) -> Duration {
        self.inner.lock().duration
    }

    /// Set the countdown target
    ///
    /// Rejected while running.
    pub fn set_duration(&self, duration: Duration) {
        if self.phase.get() == TimerPhase::Running {
            tracing::warn!("cannot set duration while the timer is running");
            return;
        }

        self.inner.lock().duration = duration;
        self.remaining.set(duration);
    }

    /// Arm the countdown, or resume a paused one
    ///
    /// Rejected while the target duration is zero.
    pub fn start(&self) {
        let now = self.time.now();
        let duration = {
            let mut inner = self.inner.lock();
            if inner.duration == Duration::ZERO {
                tracing::warn!("timer duration not set");
                return;
            }

            if self.phase.get() == TimerPhase::Paused {
                // Elapsed-since-anchor continues where the pause froze it
                inner.anchor = Some(now.saturating_sub(inner.paused_offset));
                None
            } else {
                inner.anchor = Some(now);
                inner.paused_offset = Duration::ZERO;
                Some(inner.duration)
            }
        };

        if let Some(duration) = duration {
            self.remaining.set(duration);
        }
        self.phase.set(TimerPhase::Running);
    }

    /// Freeze the countdown
    ///
    /// Only valid while running.
    pub fn pause(&self) {
        if self.phase.get() != TimerPhase::Running {
            tracing::warn!("pause ignored: timer is not running");
            return;
        }

        let now = self.time.now();
        {
            let mut inner = self.inner.lock();
            if let Some(anchor) = inner.anchor {
                inner.paused_offset = now - anchor;
            }
        }
        self.phase.set(TimerPhase::Paused);
    }

    /// Disarm the countdown from any phase
    pub fn stop(&self) {
        {
            let mut inner = self.inner.lock();
            inner.anchor = None;
            inner.paused_offset = Duration::ZERO;
        }
        self.phase.set(TimerPhase::Idle);
        self.remaining.set(Duration::ZERO);
    }

    /// Equivalent to `stop()`
    pub fn reset(&self) {
        self.stop();
    }

    /// Scheduler tick: advance the countdown while running
    pub fn tick(&self) {
        if self.phase.get() != TimerPhase::Running {
            return;
        }

        let remaining = {
            let inner = self.inner.lock();
            let Some(anchor) = inner.anchor else {
                return;
            };
            inner.duration.saturating_sub(self.time.now() - anchor)
        };

        if remaining == Duration::ZERO {
            self.remaining.set(Duration::ZERO);
            // Leaving Running here is what makes the signal single-fire
            self.phase.set(TimerPhase::Completed);
            self.completed.emit(&());
        } else {
            self.remaining.set(remaining);
        }
    }

    /// Resume-from-background: the suspended interval counts as elapsed
    ///
    /// Shifts the anchor back by the gap, unlike `pause()` which freezes
    /// the countdown.
    pub fn on_resume(&self, gap: Duration) {
        if self.phase.get() != TimerPhase::Running {
            return;
        }

        {
            let mut inner = self.inner.lock();
            if let Some(anchor) = inner.anchor {
                inner.anchor = Some(anchor.saturating_sub(gap));
            }
        }
        self.tick();
    }
}
