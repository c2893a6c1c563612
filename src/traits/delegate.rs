//! Notification interface for inbound protocol events.
//!
//! Every method has an empty default body, so a consumer only overrides the
//! events it cares about. `()` implements the trait and discards everything.
//!
//! Per-throttle events carry the [`ThrottleId`] exactly as it appeared on the
//! wire. Use [`ThrottleId::is_default`] to tell the legacy `'T'` throttle apart
//! from the numbered multi-throttle ids.
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::{Delegate, ThrottleId};
//!
//! #[derive(Default)]
//! struct SpeedWatcher {
//!     last: Option<(ThrottleId, u8)>,
//! }
//!
//! impl Delegate for SpeedWatcher {
//!     fn received_speed(&mut self, throttle: ThrottleId, speed: u8) {
//!         self.last = Some((throttle, speed));
//!     }
//! }
//!
//! let mut watcher = SpeedWatcher::default();
//! watcher.received_speed(ThrottleId::DEFAULT, 12);
//! watcher.received_version("2.0"); // default no-op
//! assert_eq!(watcher.last, Some((ThrottleId::DEFAULT, 12)));
//! ```

use crate::types::{
    Direction, FunctionLabels, ListEntry, RosterEntry, RouteState, SpeedSteps, ThrottleId,
    TrackPower, TurnoutState,
};

/// Receives decoded server messages.
///
/// Calls are made synchronously from inside [`WiThrottle::check`]; the engine
/// never retries or waits on a notification.
///
/// [`WiThrottle::check`]: crate::WiThrottle::check
#[allow(unused_variables)]
pub trait Delegate {
    // ========================================================================
    // Session
    // ========================================================================

    /// Protocol version (`VN`).
    fn received_version(&mut self, version: &str) {}

    /// Server type (`HT`).
    fn received_server_type(&mut self, server_type: &str) {}

    /// Server description (`Ht`).
    fn received_server_description(&mut self, description: &str) {}

    /// Informational message (`Hm`).
    fn received_message(&mut self, message: &str) {}

    /// Alert message (`HM`).
    fn received_alert(&mut self, alert: &str) {}

    /// Web server port (`PW`).
    fn received_web_port(&mut self, port: i32) {}

    /// Track power state (`PPA`).
    fn received_track_power(&mut self, state: TrackPower) {}

    /// Heartbeat period the server requires, in seconds. Only called for
    /// periods greater than zero.
    fn heartbeat_config(&mut self, period_secs: u32) {}

    /// Fast-clock time announced by the server.
    fn fast_time_changed(&mut self, time: f64) {}

    /// Fast-clock rate announced by the server.
    fn fast_time_rate_changed(&mut self, rate: f32) {}

    // ========================================================================
    // Lists
    // ========================================================================

    /// Number of roster entries announced by an `RL` line. Sent before the
    /// entries themselves.
    fn received_roster_entries(&mut self, count: usize) {}

    /// One roster entry; `index` counts from zero.
    fn received_roster_entry(&mut self, index: usize, entry: &RosterEntry) {}

    /// Number of turnouts in a `PTL` line. Sent after the entries.
    fn received_turnout_entries(&mut self, count: usize) {}

    /// One turnout list entry.
    fn received_turnout_entry(&mut self, index: usize, entry: &ListEntry) {}

    /// Number of routes in a `PRL` line. Sent after the entries.
    fn received_route_entries(&mut self, count: usize) {}

    /// One route list entry.
    fn received_route_entry(&mut self, index: usize, entry: &ListEntry) {}

    // ========================================================================
    // Throttles
    // ========================================================================

    /// Function pressed or released.
    fn received_function_state(&mut self, throttle: ThrottleId, number: u8, pressed: bool) {}

    /// Function labels for the locomotive on a throttle, blank-padded.
    fn received_roster_function_list(&mut self, throttle: ThrottleId, labels: &FunctionLabels) {}

    /// Speed, already clamped to 0..=126.
    fn received_speed(&mut self, throttle: ThrottleId, speed: u8) {}

    /// Aggregate direction.
    fn received_direction(&mut self, throttle: ThrottleId, direction: Direction) {}

    /// Speed-step mode.
    fn received_speed_steps(&mut self, throttle: ThrottleId, steps: SpeedSteps) {}

    /// The server confirmed a locomotive on a throttle.
    fn address_added(&mut self, throttle: ThrottleId, address: &str, entry: &str) {}

    /// The server released a locomotive. `command` is `d` or `r`.
    fn address_removed(&mut self, throttle: ThrottleId, address: &str, command: &str) {}

    /// The locomotive is in use elsewhere and must be stolen to acquire it.
    fn address_steal_needed(&mut self, throttle: ThrottleId, address: &str, entry: &str) {}

    // ========================================================================
    // Accessories
    // ========================================================================

    /// Turnout changed state.
    fn received_turnout_action(&mut self, system_name: &str, state: TurnoutState) {}

    /// Route changed state.
    fn received_route_action(&mut self, system_name: &str, state: RouteState) {}

    /// A line the client does not understand.
    fn received_unknown_command(&mut self, line: &str) {}
}

impl Delegate for () {}

impl<D: Delegate + ?Sized> Delegate for &mut D {
    fn received_version(&mut self, version: &str) {
        (**self).received_version(version)
    }
    fn received_server_type(&mut self, server_type: &str) {
        (**self).received_server_type(server_type)
    }
    fn received_server_description(&mut self, description: &str) {
        (**self).received_server_description(description)
    }
    fn received_message(&mut self, message: &str) {
        (**self).received_message(message)
    }
    fn received_alert(&mut self, alert: &str) {
        (**self).received_alert(alert)
    }
    fn received_web_port(&mut self, port: i32) {
        (**self).received_web_port(port)
    }
    fn received_track_power(&mut self, state: TrackPower) {
        (**self).received_track_power(state)
    }
    fn heartbeat_config(&mut self, period_secs: u32) {
        (**self).heartbeat_config(period_secs)
    }
    fn fast_time_changed(&mut self, time: f64) {
        (**self).fast_time_changed(time)
    }
    fn fast_time_rate_changed(&mut self, rate: f32) {
        (**self).fast_time_rate_changed(rate)
    }
    fn received_roster_entries(&mut self, count: usize) {
        (**self).received_roster_entries(count)
    }
    fn received_roster_entry(&mut self, index: usize, entry: &RosterEntry) {
        (**self).received_roster_entry(index, entry)
    }
    fn received_turnout_entries(&mut self, count: usize) {
        (**self).received_turnout_entries(count)
    }
    fn received_turnout_entry(&mut self, index: usize, entry: &ListEntry) {
        (**self).received_turnout_entry(index, entry)
    }
    fn received_route_entries(&mut self, count: usize) {
        (**self).received_route_entries(count)
    }
    fn received_route_entry(&mut self, index: usize, entry: &ListEntry) {
        (**self).received_route_entry(index, entry)
    }
    fn received_function_state(&mut self, throttle: ThrottleId, number: u8, pressed: bool) {
        (**self).received_function_state(throttle, number, pressed)
    }
    fn received_roster_function_list(&mut self, throttle: ThrottleId, labels: &FunctionLabels) {
        (**self).received_roster_function_list(throttle, labels)
    }
    fn received_speed(&mut self, throttle: ThrottleId, speed: u8) {
        (**self).received_speed(throttle, speed)
    }
    fn received_direction(&mut self, throttle: ThrottleId, direction: Direction) {
        (**self).received_direction(throttle, direction)
    }
    fn received_speed_steps(&mut self, throttle: ThrottleId, steps: SpeedSteps) {
        (**self).received_speed_steps(throttle, steps)
    }
    fn address_added(&mut self, throttle: ThrottleId, address: &str, entry: &str) {
        (**self).address_added(throttle, address, entry)
    }
    fn address_removed(&mut self, throttle: ThrottleId, address: &str, command: &str) {
        (**self).address_removed(throttle, address, command)
    }
    fn address_steal_needed(&mut self, throttle: ThrottleId, address: &str, entry: &str) {
        (**self).address_steal_needed(throttle, address, entry)
    }
    fn received_turnout_action(&mut self, system_name: &str, state: TurnoutState) {
        (**self).received_turnout_action(system_name, state)
    }
    fn received_route_action(&mut self, system_name: &str, state: RouteState) {
        (**self).received_route_action(system_name, state)
    }
    fn received_unknown_command(&mut self, line: &str) {
        (**self).received_unknown_command(line)
    }
}
