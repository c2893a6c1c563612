//! Mock implementations for testing without a server.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockTransport`] | [`Transport`] | Scripted inbound bytes, captured writes |
//! | [`RecordingDelegate`] | [`Delegate`] | Records every notification as a [`DelegateEvent`] |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::{ProtocolConfig, ThrottleId, WiThrottle};
//! use rs_withrottle::hal::{DelegateEvent, MockTransport, RecordingDelegate};
//!
//! let mut wit = WiThrottle::new(ProtocolConfig::default());
//! let mut delegate = RecordingDelegate::new();
//!
//! let mut transport = MockTransport::new();
//! transport.feed("VN2.0\n\n");
//! wit.connect(transport, 0);
//!
//! wit.check(0, &mut delegate).unwrap();
//! assert_eq!(delegate.events, [DelegateEvent::Version("2.0".into())]);
//! ```
//!
//! [`Transport`]: crate::traits::Transport
//! [`Delegate`]: crate::traits::Delegate
//! [`Clock`]: crate::traits::Clock

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::traits::{Clock, Delegate, Transport};
use crate::types::{
    Direction, FunctionLabels, ListEntry, RosterEntry, RouteState, SpeedSteps, ThrottleId,
    TrackPower, TurnoutState,
};

// ============================================================================
// Transport Mock
// ============================================================================

/// Mock transport for testing.
///
/// Bytes queued with [`feed`](Self::feed) are handed out by `read_byte`;
/// everything the client writes lands in [`written`](Self::written).
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Bytes waiting to be read.
    pub incoming: VecDeque<u8>,
    /// Every byte written so far.
    pub written: Vec<u8>,
    /// When set, `write` fails.
    pub fail_writes: bool,
}

impl MockTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues text for the client to read.
    pub fn feed(&mut self, text: &str) {
        self.incoming.extend(text.as_bytes());
    }

    /// Written output split into non-empty lines, `\r` stripped.
    pub fn sent_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }

    /// Like [`sent_lines`](Self::sent_lines) but clears the captured output.
    pub fn take_sent_lines(&mut self) -> Vec<String> {
        let lines = self.sent_lines();
        self.written.clear();
        lines
    }
}

impl Transport for MockTransport {
    type Error = ();

    fn available(&mut self) -> Result<usize, ()> {
        Ok(self.incoming.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ()> {
        Ok(self.incoming.pop_front())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.written.extend_from_slice(bytes);
        Ok(())
    }
}

// ============================================================================
// Delegate Mock
// ============================================================================

/// One recorded [`Delegate`] call.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum DelegateEvent {
    Version(String),
    ServerType(String),
    ServerDescription(String),
    Message(String),
    Alert(String),
    WebPort(i32),
    TrackPower(TrackPower),
    HeartbeatConfig(u32),
    FastTime(f64),
    FastTimeRate(f32),
    RosterEntries(usize),
    RosterEntry(usize, RosterEntry),
    TurnoutEntries(usize),
    TurnoutEntry(usize, ListEntry),
    RouteEntries(usize),
    RouteEntry(usize, ListEntry),
    FunctionState(ThrottleId, u8, bool),
    FunctionList(ThrottleId, Vec<String>),
    Speed(ThrottleId, u8),
    Direction(ThrottleId, Direction),
    SpeedSteps(ThrottleId, SpeedSteps),
    AddressAdded(ThrottleId, String, String),
    AddressRemoved(ThrottleId, String, String),
    StealNeeded(ThrottleId, String, String),
    TurnoutAction(String, TurnoutState),
    RouteAction(String, RouteState),
    UnknownCommand(String),
}

/// Delegate that records every notification in order.
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    /// Notifications received so far.
    pub events: Vec<DelegateEvent>,
}

impl RecordingDelegate {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears the recorded events.
    pub fn take(&mut self) -> Vec<DelegateEvent> {
        core::mem::take(&mut self.events)
    }
}

impl Delegate for RecordingDelegate {
    fn received_version(&mut self, version: &str) {
        self.events.push(DelegateEvent::Version(version.into()));
    }
    fn received_server_type(&mut self, server_type: &str) {
        self.events.push(DelegateEvent::ServerType(server_type.into()));
    }
    fn received_server_description(&mut self, description: &str) {
        self.events
            .push(DelegateEvent::ServerDescription(description.into()));
    }
    fn received_message(&mut self, message: &str) {
        self.events.push(DelegateEvent::Message(message.into()));
    }
    fn received_alert(&mut self, alert: &str) {
        self.events.push(DelegateEvent::Alert(alert.into()));
    }
    fn received_web_port(&mut self, port: i32) {
        self.events.push(DelegateEvent::WebPort(port));
    }
    fn received_track_power(&mut self, state: TrackPower) {
        self.events.push(DelegateEvent::TrackPower(state));
    }
    fn heartbeat_config(&mut self, period_secs: u32) {
        self.events.push(DelegateEvent::HeartbeatConfig(period_secs));
    }
    fn fast_time_changed(&mut self, time: f64) {
        self.events.push(DelegateEvent::FastTime(time));
    }
    fn fast_time_rate_changed(&mut self, rate: f32) {
        self.events.push(DelegateEvent::FastTimeRate(rate));
    }
    fn received_roster_entries(&mut self, count: usize) {
        self.events.push(DelegateEvent::RosterEntries(count));
    }
    fn received_roster_entry(&mut self, index: usize, entry: &RosterEntry) {
        self.events
            .push(DelegateEvent::RosterEntry(index, entry.clone()));
    }
    fn received_turnout_entries(&mut self, count: usize) {
        self.events.push(DelegateEvent::TurnoutEntries(count));
    }
    fn received_turnout_entry(&mut self, index: usize, entry: &ListEntry) {
        self.events
            .push(DelegateEvent::TurnoutEntry(index, entry.clone()));
    }
    fn received_route_entries(&mut self, count: usize) {
        self.events.push(DelegateEvent::RouteEntries(count));
    }
    fn received_route_entry(&mut self, index: usize, entry: &ListEntry) {
        self.events.push(DelegateEvent::RouteEntry(index, entry.clone()));
    }
    fn received_function_state(&mut self, throttle: ThrottleId, number: u8, pressed: bool) {
        self.events
            .push(DelegateEvent::FunctionState(throttle, number, pressed));
    }
    fn received_roster_function_list(&mut self, throttle: ThrottleId, labels: &FunctionLabels) {
        self.events
            .push(DelegateEvent::FunctionList(throttle, labels.to_vec()));
    }
    fn received_speed(&mut self, throttle: ThrottleId, speed: u8) {
        self.events.push(DelegateEvent::Speed(throttle, speed));
    }
    fn received_direction(&mut self, throttle: ThrottleId, direction: Direction) {
        self.events.push(DelegateEvent::Direction(throttle, direction));
    }
    fn received_speed_steps(&mut self, throttle: ThrottleId, steps: SpeedSteps) {
        self.events.push(DelegateEvent::SpeedSteps(throttle, steps));
    }
    fn address_added(&mut self, throttle: ThrottleId, address: &str, entry: &str) {
        self.events
            .push(DelegateEvent::AddressAdded(throttle, address.into(), entry.into()));
    }
    fn address_removed(&mut self, throttle: ThrottleId, address: &str, command: &str) {
        self.events.push(DelegateEvent::AddressRemoved(
            throttle,
            address.into(),
            command.into(),
        ));
    }
    fn address_steal_needed(&mut self, throttle: ThrottleId, address: &str, entry: &str) {
        self.events
            .push(DelegateEvent::StealNeeded(throttle, address.into(), entry.into()));
    }
    fn received_turnout_action(&mut self, system_name: &str, state: TurnoutState) {
        self.events
            .push(DelegateEvent::TurnoutAction(system_name.into(), state));
    }
    fn received_route_action(&mut self, system_name: &str, state: RouteState) {
        self.events
            .push(DelegateEvent::RouteAction(system_name.into(), state));
    }
    fn received_unknown_command(&mut self, line: &str) {
        self.events.push(DelegateEvent::UnknownCommand(line.into()));
    }
}

// ============================================================================
// Clock Mock
// ============================================================================

/// Mock clock for testing.
///
/// # Example
///
/// ```rust
/// use rs_withrottle::hal::MockClock;
/// use rs_withrottle::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(1000);
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}
