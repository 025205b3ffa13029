//! Meridian Clock - Wall-clock synchronization engine
//!
//! Owns the wall-clock state (local/UTC/regional readings and the
//! synchronized flag), periodically resynchronizes against the network
//! resolver, and degrades gracefully to the plain system clock when the
//! network is unavailable or the last offset has expired.

pub mod engine;
pub mod zone;

pub use engine::*;
pub use zone::*;
