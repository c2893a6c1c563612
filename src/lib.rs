//! # rs-withrottle
//!
//! A client for the WiThrottle protocol, the line-oriented text protocol
//! JMRI, DCC-EX, and Digitrax LnWi servers speak to handheld throttles.
//!
//! ## Features
//!
//! - **Polled engine**: one [`WiThrottle::check`] call per loop iteration, no threads or timers
//! - **Six throttles**: independent consists with speed, direction, and speed-step tracking
//! - **Paced output**: commands are queued and released with a minimum gap
//! - **Heartbeat**: keep-alive traffic plus speed/direction resync when the server asks for it
//! - **Fast clock**: simulated layout time advanced between server updates
//! - **`no_std` + `alloc`**: the core only needs a [`Transport`] and a millisecond timestamp
//!
//! ## Architecture
//!
//! - `framer` - Bytes to lines
//! - `dispatch` - Lines to state changes and [`Delegate`] calls
//! - `throttle` - Per-throttle state and the mutation API
//! - `queue` - Outbound pacing
//! - `heartbeat`, `fast_clock` - Periodic housekeeping
//! - `client` - [`WiThrottle`], which ties everything together
//! - `hal` - Concrete transports (mock for testing, TCP for desktop)
//!
//! ## Example
//!
//! ```rust
//! use rs_withrottle::{ProtocolConfig, ThrottleId, WiThrottle};
//! use rs_withrottle::hal::{DelegateEvent, MockTransport, RecordingDelegate};
//!
//! let config = ProtocolConfig::default().with_device_name("Cab 1");
//! let mut wit = WiThrottle::new(config);
//! let mut delegate = RecordingDelegate::new();
//!
//! let mut transport = MockTransport::new();
//! transport.feed("VN2.0\n\nPPA1\n\n");
//! wit.connect(transport, 0);
//!
//! wit.add_locomotive(ThrottleId::DEFAULT, "L1234").unwrap();
//!
//! // Call from your main loop with the current time
//! wit.check(50, &mut delegate).unwrap();
//! assert_eq!(delegate.events[0], DelegateEvent::Version("2.0".into()));
//! assert_eq!(wit.lead_locomotive(ThrottleId::DEFAULT), Some("L1234"));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Protocol engine: polling entry point and public API.
pub mod client;
/// Client configuration (server address, pacing, identity).
pub mod config;
/// Errors returned by rejected throttle requests.
pub mod error;
/// Fast-clock simulation.
pub mod fast_clock;
/// Inbound line framing.
pub mod framer;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Heartbeat keep-alive scheduling.
pub mod heartbeat;
/// Outbound command queue with pacing.
pub mod queue;
/// Per-throttle state and mutation API.
pub mod throttle;
/// Collaborator traits: transport, delegate, clock.
pub mod traits;
/// Protocol value types.
pub mod types;
/// Separators, tokenizer, and outbound command encoding.
pub mod wire;

mod dispatch;

// Re-exports for convenience
pub use client::WiThrottle;
pub use config::{Config, ProtocolConfig, ServerConfig};
pub use error::CommandError;
pub use throttle::{LocomotiveEntry, ThrottleSlot, ThrottleTable};
pub use traits::{Clock, Delegate, Transport};
pub use types::{
    Direction, FunctionLabels, ListEntry, RosterEntry, RouteState, SpeedSteps, ThrottleId,
    TrackPower, TurnoutAction, TurnoutState, MAX_FUNCTIONS, MAX_THROTTLES,
};

#[cfg(feature = "serde-json-core")]
pub use config::from_json;
