//! Concrete implementations of the traits defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test doubles for transport, delegate, and clock
//! - `tcp`: Non-blocking TCP transport and system clock (requires `std` feature)

pub mod mock;

#[cfg(feature = "std")]
pub mod tcp;

pub use mock::*;

#[cfg(feature = "std")]
pub use tcp::*;
