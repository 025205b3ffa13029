//! Meridian SNTP - Network time resolution
//!
//! This crate implements the network side of clock synchronization:
//! - Fixed 48-byte SNTP packet codec
//! - Ranked-candidate resolver with per-candidate timeout and fallback
//!
//! The resolver never surfaces a hard failure beyond `Unavailable`; the
//! clock engine degrades to system time when it sees one.

pub mod resolver;
pub mod wire;

pub use resolver::*;
pub use wire::*;
