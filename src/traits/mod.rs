//! Collaborator traits the protocol engine is generic over.
//!
//! The engine owns no I/O and no callbacks of its own. Hosts supply:
//!
//! - [`Transport`]: the byte stream to the server
//! - [`Delegate`]: the consumer of decoded server events
//! - [`Clock`]: a millisecond time source (optional; `check` takes `now_ms`)
//!
//! Test doubles for all three live in [`crate::hal::mock`].

pub mod delegate;
pub mod transport;

pub use delegate::*;
pub use transport::*;
