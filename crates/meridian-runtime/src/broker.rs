//! Unified event stream over the engine observables
//!
//! Presentation and integration layers that want one subscription instead
//! of five attach here. Phase and flag events inherit distinct-until-changed
//! semantics from the underlying properties.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use meridian_core::{LapRecord, Signal, TimerPhase};

use crate::ClockRuntime;

/// Kind of application event
#[derive(Clone, Debug, PartialEq)]
pub enum ClockEventKind {
    TimerPhaseChanged(TimerPhase),
    TimerCompleted,
    StopwatchRunningChanged(bool),
    LapRecorded(LapRecord),
    SyncStateChanged(bool),
}

/// Timestamped application event
#[derive(Clone, Debug, PartialEq)]
pub struct ClockEvent {
    pub kind: ClockEventKind,
    pub at: DateTime<Utc>,
}

impl ClockEvent {
    fn now(kind: ClockEventKind) -> Self {
        ClockEvent {
            kind,
            at: Utc::now(),
        }
    }
}

/// Fans engine notifications into one stream
pub struct EventBroker {
    events: Arc<Signal<ClockEvent>>,
}

impl EventBroker {
    /// Wire a broker to a runtime's engines
    ///
    /// Subscriptions live as long as the engines do.
    pub fn attach(runtime: &ClockRuntime) -> Self {
        let events = Arc::new(Signal::new());

        let sink = events.clone();
        runtime.timer().completed().subscribe(move |_| {
            sink.emit(&ClockEvent::now(ClockEventKind::TimerCompleted));
        });

        let sink = events.clone();
        runtime.timer().phase().subscribe(move |phase| {
            sink.emit(&ClockEvent::now(ClockEventKind::TimerPhaseChanged(*phase)));
        });

        let sink = events.clone();
        runtime.stopwatch().running().subscribe(move |running| {
            sink.emit(&ClockEvent::now(ClockEventKind::StopwatchRunningChanged(
                *running,
            )));
        });

        let sink = events.clone();
        runtime.stopwatch().lap_recorded().subscribe(move |lap| {
            sink.emit(&ClockEvent::now(ClockEventKind::LapRecorded(*lap)));
        });

        let sink = events.clone();
        runtime.clock().synchronized().subscribe(move |flag| {
            sink.emit(&ClockEvent::now(ClockEventKind::SyncStateChanged(*flag)));
        });

        EventBroker { events }
    }

    /// The merged event stream
    pub fn events(&self) -> &Signal<ClockEvent> {
        &self.events
    }
}
