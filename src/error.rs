//! Errors returned by the throttle mutation API.
//!
//! These only describe rejected *requests*. Nothing the server sends ever
//! produces an error; malformed input is logged and skipped.

use thiserror::Error;

use crate::types::ThrottleId;

/// Why a throttle request was rejected before anything was queued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Speed outside 0..=126.
    #[error("speed {0} is outside 0..=126")]
    InvalidSpeed(i32),

    /// The throttle has no locomotive selected.
    #[error("throttle {0} has no locomotive selected")]
    NotSelected(ThrottleId),

    /// Address does not start with `S` (short) or `L` (long).
    #[error("address must start with S or L")]
    InvalidAddress,

    /// Function number outside 0..32.
    #[error("function {0} is outside 0..32")]
    FunctionOutOfRange(u8),
}
