//! Meridian Test - Scenario harness for the time engines
//!
//! Provides:
//! - `ScenarioClock`: all engines on one scripted time source, advanced in
//!   explicit steps with the scheduler tick applied after each step
//! - Loopback SNTP responders with scripted behaviors for resolver and
//!   sync-engine tests

pub mod harness;
pub mod loopback;

pub use harness::*;
pub use loopback::*;
