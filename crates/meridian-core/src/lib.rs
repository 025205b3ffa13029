//! Meridian Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the meridian engines:
//! - Monotonic time and time sources
//! - Wall-clock samples and sync state
//! - Stopwatch and timer records
//! - Observable properties and signals
//! - Error taxonomy
//! - Display formatting

pub mod error;
pub mod format;
pub mod observe;
pub mod record;
pub mod source;
pub mod time;

pub use error::*;
pub use format::*;
pub use observe::*;
pub use record::*;
pub use source::*;
pub use time::*;
