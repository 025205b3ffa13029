//! Error types for the meridian engines

use thiserror::Error;

/// Errors surfaced by the meridian engines
///
/// None of these are fatal: resolver failures degrade the clock to system
/// time, and invalid engine operations are rejected as logged no-ops before
/// an error value is ever constructed.
#[derive(Error, Debug)]
pub enum MeridianError {
    // Resolver errors
    #[error("no time server candidate responded")]
    Unavailable,

    #[error("name resolution failed for {0}")]
    NameResolution(String),

    #[error("transport error: {0}")]
    Transport(String),

    // Response validation errors
    #[error("response too short: expected {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    #[error("implausible server time: {days} days away from the system clock")]
    ImplausibleTime { days: i64 },
}

/// Result type for meridian operations
pub type MeridianResult<T> = Result<T, MeridianError>;
