//! Meridian Runtime - Engine orchestration and application surface
//!
//! This crate ties the engines together the way a host application consumes
//! them:
//! - One runtime owns the clock, stopwatch, and timer engines
//! - A single scheduler task drives the stopwatch/timer recompute tick
//! - Background/foreground lifecycle signals fan out by direct reference
//! - Engine notifications merge into one `ClockEvent` stream

pub mod broker;
pub mod runtime;

pub use broker::*;
pub use runtime::*;
