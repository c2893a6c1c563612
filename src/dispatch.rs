//! Inbound command dispatch.
//!
//! [`process_line`] takes one complete line from the framer, routes it by
//! prefix to a handler, and reports whether anything visible changed. Every
//! line is self-contained; the only state carried between lines is the
//! [`Session`] the handlers mutate.
//!
//! Prefixes are tested in a fixed order, each with a minimum line length:
//!
//! | Prefix | Min len | Handler |
//! |--------|---------|---------|
//! | `PFT` | 4 | fast clock |
//! | `PPA` | 4 | track power |
//! | `*` | 2 | heartbeat period |
//! | `VN` `HT` `Ht` `HM` `Hm` `PW` `RL` | 3 | session info, roster |
//! | `PTL` `PRL` | 4 | turnout / route lists |
//! | `M?S` `M?+` `M?-` | 7 | steal, add, remove |
//! | `M?A` `M?L` | 9 | locomotive action, function labels |
//! | `PTA` | 6 | turnout action |
//! | `PRA` | 5 | route action |
//! | `AT+` | 4 | ignored |
//!
//! Anything else goes to [`Delegate::received_unknown_command`].

use alloc::string::String;

use log::{debug, trace, warn};

use crate::fast_clock::FastClock;
use crate::heartbeat::HeartbeatMonitor;
use crate::throttle::ThrottleTable;
use crate::traits::Delegate;
use crate::types::{
    Direction, FunctionLabels, ListEntry, RosterEntry, RouteState, SpeedSteps, ThrottleId,
    TrackPower, TurnoutState, MAX_FUNCTIONS,
};
use crate::wire::{
    leading_int, split, split_property, ALL_LOCOMOTIVES, ENTRY_SEPARATOR, PROPERTY_SEPARATOR,
    SEGMENT_SEPARATOR,
};

/// Preamble some WiFi bridges prepend to lines, possibly several times.
pub const NOISE_PREAMBLE: &str = "AT+CIPSENDBUF=";

/// Protocol state shared by the dispatcher and the mutation API.
#[derive(Debug)]
pub(crate) struct Session {
    pub throttles: ThrottleTable,
    pub fast_clock: FastClock,
    pub heartbeat: HeartbeatMonitor,
    pub last_server_response_secs: u64,
    pub clock_changed: bool,
    pub heartbeat_changed: bool,
}

impl Session {
    pub fn new(now_ms: u64) -> Self {
        Self {
            throttles: ThrottleTable::new(),
            fast_clock: FastClock::new(now_ms),
            heartbeat: HeartbeatMonitor::new(now_ms),
            last_server_response_secs: now_ms / 1000,
            clock_changed: false,
            heartbeat_changed: false,
        }
    }

    pub fn reset_change_flags(&mut self) {
        self.clock_changed = false;
        self.heartbeat_changed = false;
    }
}

/// Routes one line to its handler. Returns true when visible state changed.
pub(crate) fn process_line<D: Delegate + ?Sized>(
    session: &mut Session,
    line: &str,
    now_ms: u64,
    delegate: &mut D,
) -> bool {
    trace!("<== {line}");
    session.last_server_response_secs = now_ms / 1000;

    let mut line = line;
    while let Some(rest) = line.strip_prefix(NOISE_PREAMBLE) {
        debug!("stripped {NOISE_PREAMBLE} preamble");
        line = rest;
    }
    let len = line.len();
    if len == 0 {
        return false;
    }

    if len > 3 {
        if let Some(payload) = line.strip_prefix("PFT") {
            return fast_time(session, payload, delegate);
        }
        if let Some(payload) = line.strip_prefix("PPA") {
            return track_power(payload, delegate);
        }
    }
    if len > 1 {
        if let Some(payload) = line.strip_prefix('*') {
            return heartbeat(session, payload, delegate);
        }
    }
    if len > 2 {
        if let Some(handled) = session_info(line, delegate) {
            return handled;
        }
    }
    if len > 3 {
        if let Some(payload) = line.strip_prefix("PTL") {
            let count = accessory_list(payload, |i, entry| delegate.received_turnout_entry(i, entry));
            delegate.received_turnout_entries(count);
            return true;
        }
        if let Some(payload) = line.strip_prefix("PRL") {
            let count = accessory_list(payload, |i, entry| delegate.received_route_entry(i, entry));
            delegate.received_route_entries(count);
            return true;
        }
    }
    if let Some((throttle, op, rest)) = throttle_command(line) {
        match op {
            'S' if len > 6 => {
                steal_needed(throttle, rest, delegate);
                return true;
            }
            '+' | '-' if len > 6 => {
                add_remove(throttle, op == '+', rest, delegate);
                return true;
            }
            'A' if len > 8 => return locomotive_action(session, throttle, rest, delegate),
            'L' if len > 8 => return roster_function_list(session, throttle, rest, delegate),
            _ => {}
        }
    }
    if len > 5 {
        if let Some(payload) = line.strip_prefix("PTA") {
            if let Some((code, name)) = state_and_name(payload) {
                delegate.received_turnout_action(name, TurnoutState::from_wire(code));
            }
            return true;
        }
    }
    if len > 4 {
        if let Some(payload) = line.strip_prefix("PRA") {
            if let Some((code, name)) = state_and_name(payload) {
                delegate.received_route_action(name, RouteState::from_wire(code));
            }
            return true;
        }
    }
    if len > 3 && line.starts_with("AT+") {
        return false;
    }

    debug!("unknown command '{line}'");
    delegate.received_unknown_command(line);
    false
}

// ============================================================================
// Session-level handlers
// ============================================================================

fn fast_time<D: Delegate + ?Sized>(session: &mut Session, payload: &str, delegate: &mut D) -> bool {
    let (time, rate) = session.fast_clock.set_from_wire(payload);
    if let Some(time) = time {
        delegate.fast_time_changed(time);
    }
    if let Some(rate) = rate {
        delegate.fast_time_rate_changed(rate);
    }
    let applied = time.is_some() || rate.is_some();
    session.clock_changed |= applied;
    applied
}

fn track_power<D: Delegate + ?Sized>(payload: &str, delegate: &mut D) -> bool {
    let state = payload
        .chars()
        .next()
        .map(TrackPower::from_wire)
        .unwrap_or(TrackPower::Unknown);
    debug!("track power {state:?}");
    delegate.received_track_power(state);
    true
}

fn heartbeat<D: Delegate + ?Sized>(session: &mut Session, payload: &str, delegate: &mut D) -> bool {
    let Some(period) = leading_int(payload) else {
        warn!("ignoring unparseable heartbeat period '{payload}'");
        return false;
    };
    let period = period.max(0) as u32;
    session.heartbeat.set_period(period);
    if period == 0 {
        return false;
    }
    session.heartbeat_changed = true;
    delegate.heartbeat_config(period);
    true
}

/// Two-letter informational prefixes. `None` when the line is not one.
fn session_info<D: Delegate + ?Sized>(line: &str, delegate: &mut D) -> Option<bool> {
    let (prefix, payload) = (line.get(..2)?, line.get(2..)?);
    match prefix {
        "VN" => delegate.received_version(payload),
        "HT" => delegate.received_server_type(payload),
        "Ht" => delegate.received_server_description(payload),
        "HM" => delegate.received_alert(payload),
        "Hm" => delegate.received_message(payload),
        "PW" => delegate.received_web_port(leading_int(payload).unwrap_or(0)),
        "RL" => roster_list(payload, delegate),
        _ => return None,
    }
    Some(true)
}

// ============================================================================
// Lists
// ============================================================================

/// `RL<count>]\[name}|{address}|{length]\[...`
fn roster_list<D: Delegate + ?Sized>(payload: &str, delegate: &mut D) {
    let mut entries = split(payload, ENTRY_SEPARATOR);
    let count = entries
        .next()
        .and_then(leading_int)
        .unwrap_or(0)
        .max(0) as usize;
    debug!("roster has {count} entries");
    delegate.received_roster_entries(count);

    for (index, raw) in entries.take(count).enumerate() {
        let mut segments = split(raw, SEGMENT_SEPARATOR);
        let entry = RosterEntry {
            name: segments.next().unwrap_or_default().into(),
            address: segments.next().and_then(leading_int).unwrap_or(0),
            length: segments.next().and_then(|s| s.chars().next()),
        };
        trace!("roster entry {index}: {entry:?}");
        delegate.received_roster_entry(index, &entry);
    }
}

/// `PTL]\[system}|{user}|{state]\[...` and the route equivalent.
///
/// The text before the first separator is skipped, as is an empty entry
/// after a trailing separator. Returns the number of entries reported.
fn accessory_list(payload: &str, mut report: impl FnMut(usize, &ListEntry)) -> usize {
    let mut entries = split(payload, ENTRY_SEPARATOR);
    entries.next();

    let mut count = 0;
    while let Some(raw) = entries.next() {
        if raw.is_empty() && entries.remainder().is_none() {
            break;
        }
        let mut segments = split(raw, SEGMENT_SEPARATOR);
        let entry = ListEntry {
            system_name: segments.next().unwrap_or_default().into(),
            user_name: segments.next().unwrap_or_default().into(),
            state: segments.next().and_then(leading_int).unwrap_or(0),
        };
        report(count, &entry);
        count += 1;
    }
    count
}

/// Splits `PTA<code><name>` / `PRA<code><name>` after the prefix.
fn state_and_name(payload: &str) -> Option<(char, &str)> {
    let mut chars = payload.chars();
    let code = chars.next()?;
    let name = chars
        .as_str()
        .trim_end_matches(|c: char| c.is_whitespace() || c.is_control());
    Some((code, name))
}

// ============================================================================
// Per-throttle handlers
// ============================================================================

/// Splits `M<id><op><rest>`.
fn throttle_command(line: &str) -> Option<(ThrottleId, char, &str)> {
    let mut chars = line.strip_prefix('M')?.chars();
    let id = chars.next()?;
    let op = chars.next()?;
    Some((ThrottleId::new(id), op, chars.as_str()))
}

fn steal_needed<D: Delegate + ?Sized>(throttle: ThrottleId, rest: &str, delegate: &mut D) {
    let (address, entry) = split_property(rest);
    debug!("throttle {throttle}: steal needed for {address}");
    delegate.address_steal_needed(throttle, address, entry.unwrap_or_default());
}

fn add_remove<D: Delegate + ?Sized>(throttle: ThrottleId, add: bool, rest: &str, delegate: &mut D) {
    let (address, Some(entry)) = split_property(rest) else {
        warn!("throttle {throttle}: add/remove without {PROPERTY_SEPARATOR}: {rest}");
        return;
    };
    let (address, entry) = (address.trim(), entry.trim());

    if add {
        delegate.address_added(throttle, address, entry);
    } else if entry == "d" || entry == "r" {
        delegate.address_removed(throttle, address, entry);
    } else {
        warn!("throttle {throttle}: malformed address removal '{entry}' for {address}");
    }
}

/// Removes a leading `<lead><;>` or `*<;>` target marker.
fn strip_target<'a>(rest: &'a str, lead: &str) -> &'a str {
    let strip = |marker: &str| {
        rest.strip_prefix(marker)
            .and_then(|r| r.strip_prefix(PROPERTY_SEPARATOR))
    };
    strip(lead).or_else(|| strip(ALL_LOCOMOTIVES)).unwrap_or(rest)
}

fn locomotive_action<D: Delegate + ?Sized>(
    session: &mut Session,
    throttle: ThrottleId,
    rest: &str,
    delegate: &mut D,
) -> bool {
    let Some(lead) = session.throttles.lead_locomotive(throttle) else {
        debug!("throttle {throttle}: action ignored, nothing selected");
        return false;
    };
    let action = strip_target(rest, lead);

    match action.as_bytes().first() {
        Some(b'F') => function_state(throttle, action, delegate),
        Some(b'V') => speed(session, throttle, action, delegate),
        Some(b's') => speed_steps(session, throttle, action, delegate),
        Some(b'R') => direction(session, throttle, action, delegate),
        Some(_) => debug!("throttle {throttle}: unrecognised action '{action}'"),
        None => {
            debug!("throttle {throttle}: empty action");
            return false;
        }
    }
    true
}

/// `F<0|1><number>`
fn function_state<D: Delegate + ?Sized>(throttle: ThrottleId, data: &str, delegate: &mut D) {
    if data.len() < 3 {
        return;
    }
    let pressed = data.as_bytes()[1] == b'1';
    let number = data
        .get(2..)
        .and_then(leading_int)
        .and_then(|n| u8::try_from(n).ok());
    match number {
        Some(number) => delegate.received_function_state(throttle, number, pressed),
        None => debug!("throttle {throttle}: bad function number in '{data}'"),
    }
}

/// `V<speed>`
fn speed<D: Delegate + ?Sized>(session: &mut Session, throttle: ThrottleId, data: &str, delegate: &mut D) {
    let Some(value) = data.get(1..).and_then(leading_int) else {
        debug!("throttle {throttle}: bad speed '{data}'");
        return;
    };
    let speed = session.throttles.slot_mut(throttle).record_speed(value);
    delegate.received_speed(throttle, speed);
}

/// `s<code>`; only the five defined step modes are accepted.
fn speed_steps<D: Delegate + ?Sized>(
    session: &mut Session,
    throttle: ThrottleId,
    data: &str,
    delegate: &mut D,
) {
    let Some(steps) = data
        .get(1..)
        .and_then(leading_int)
        .and_then(SpeedSteps::from_code)
    else {
        debug!("throttle {throttle}: ignoring speed steps '{data}'");
        return;
    };
    session.throttles.slot_mut(throttle).record_speed_steps(steps);
    delegate.received_speed_steps(throttle, steps);
}

/// `R<0|1>`
fn direction<D: Delegate + ?Sized>(
    session: &mut Session,
    throttle: ThrottleId,
    data: &str,
    delegate: &mut D,
) {
    if data.len() != 2 {
        return;
    }
    let direction = Direction::from_wire(char::from(data.as_bytes()[1]));
    session.throttles.slot_mut(throttle).record_direction(direction);
    delegate.received_direction(throttle, direction);
}

fn roster_function_list<D: Delegate + ?Sized>(
    session: &mut Session,
    throttle: ThrottleId,
    rest: &str,
    delegate: &mut D,
) -> bool {
    let Some(lead) = session.throttles.lead_locomotive(throttle) else {
        debug!("throttle {throttle}: function list ignored, nothing selected");
        return false;
    };
    let list = strip_target(rest, lead);
    if list.is_empty() {
        return false;
    }
    if !list.starts_with(']') {
        debug!("throttle {throttle}: unrecognised function list '{list}'");
        return true;
    }

    let mut labels: FunctionLabels = core::array::from_fn(|_| String::new());
    let mut entries = split(list, ENTRY_SEPARATOR);
    entries.next();
    for (slot, label) in labels.iter_mut().zip(entries.take(MAX_FUNCTIONS)) {
        slot.push_str(label);
    }
    delegate.received_roster_function_list(throttle, &labels);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::{DelegateEvent as E, RecordingDelegate};
    use crate::queue::OutboundQueue;
    use alloc::vec::Vec;

    const T: ThrottleId = ThrottleId::DEFAULT;

    fn run(session: &mut Session, line: &str) -> (bool, Vec<E>) {
        let mut delegate = RecordingDelegate::new();
        let changed = process_line(session, line, 0, &mut delegate);
        (changed, delegate.events)
    }

    fn selected(address: &str) -> Session {
        let mut session = Session::new(0);
        let mut queue = OutboundQueue::new(0, 0);
        session
            .throttles
            .add_locomotive(T, address, 0, &mut queue)
            .unwrap();
        session
    }

    // =========================================================================
    // Session lines
    // =========================================================================

    #[test]
    fn version_and_server_info() {
        let mut s = Session::new(0);
        assert_eq!(run(&mut s, "VN2.0").1, [E::Version("2.0".into())]);
        assert_eq!(run(&mut s, "HTJMRI").1, [E::ServerType("JMRI".into())]);
        assert_eq!(run(&mut s, "Htlayout").1, [E::ServerDescription("layout".into())]);
        assert_eq!(run(&mut s, "HMalert!").1, [E::Alert("alert!".into())]);
        assert_eq!(run(&mut s, "Hmhello").1, [E::Message("hello".into())]);
        assert_eq!(run(&mut s, "PW12080").1, [E::WebPort(12080)]);
    }

    #[test]
    fn bare_prefix_is_unknown() {
        let mut s = Session::new(0);
        let (changed, events) = run(&mut s, "VN");
        assert!(!changed);
        assert_eq!(events, [E::UnknownCommand("VN".into())]);
    }

    #[test]
    fn track_power_codes() {
        let mut s = Session::new(0);
        assert_eq!(run(&mut s, "PPA1").1, [E::TrackPower(TrackPower::On)]);
        assert_eq!(run(&mut s, "PPA0").1, [E::TrackPower(TrackPower::Off)]);
        assert_eq!(run(&mut s, "PPA2").1, [E::TrackPower(TrackPower::Unknown)]);
    }

    #[test]
    fn heartbeat_period() {
        let mut s = Session::new(0);
        let (changed, events) = run(&mut s, "*10");
        assert!(changed);
        assert!(s.heartbeat_changed);
        assert_eq!(s.heartbeat.period_secs(), 10);
        assert_eq!(events, [E::HeartbeatConfig(10)]);

        s.reset_change_flags();
        let (changed, events) = run(&mut s, "*0");
        assert!(!changed);
        assert!(!s.heartbeat_changed);
        assert!(!s.heartbeat.is_enabled());
        assert!(events.is_empty());
    }

    #[test]
    fn unparseable_heartbeat_keeps_period() {
        let mut s = Session::new(0);
        run(&mut s, "*10");
        s.reset_change_flags();
        let (changed, events) = run(&mut s, "*abc");
        assert!(!changed);
        assert!(!s.heartbeat_changed);
        assert_eq!(s.heartbeat.period_secs(), 10);
        assert!(events.is_empty());
    }

    #[test]
    fn fast_time_overwrites() {
        let mut s = Session::new(0);
        let (changed, events) = run(&mut s, "PFT1000<;>4.0");
        assert!(changed);
        assert!(s.clock_changed);
        assert_eq!(s.fast_clock.value(), 1000.0);
        assert_eq!(s.fast_clock.rate(), 4.0);
        assert_eq!(events, [E::FastTime(1000.0), E::FastTimeRate(4.0)]);

        let (_, events) = run(&mut s, "PFT20");
        assert_eq!(s.fast_clock.value(), 20.0);
        assert_eq!(s.fast_clock.rate(), 4.0);
        assert_eq!(events, [E::FastTime(20.0)]);
    }

    #[test]
    fn unparseable_fast_time_keeps_clock() {
        let mut s = Session::new(0);
        run(&mut s, "PFT1000<;>4.0");
        s.reset_change_flags();
        let (changed, events) = run(&mut s, "PFTxyz<;>?");
        assert!(!changed);
        assert!(!s.clock_changed);
        assert_eq!(s.fast_clock.value(), 1000.0);
        assert_eq!(s.fast_clock.rate(), 4.0);
        assert!(events.is_empty());
    }

    #[test]
    fn noise_preamble_is_stripped_repeatedly() {
        let mut s = Session::new(0);
        let (_, events) = run(&mut s, "AT+CIPSENDBUF=AT+CIPSENDBUF=PPA1");
        assert_eq!(events, [E::TrackPower(TrackPower::On)]);
    }

    #[test]
    fn at_commands_are_ignored_silently() {
        let mut s = Session::new(0);
        let (changed, events) = run(&mut s, "AT+RST");
        assert!(!changed);
        assert!(events.is_empty());
    }

    #[test]
    fn unknown_line_reported() {
        let mut s = Session::new(0);
        let (changed, events) = run(&mut s, "XYZ");
        assert!(!changed);
        assert_eq!(events, [E::UnknownCommand("XYZ".into())]);
    }

    #[test]
    fn every_line_updates_response_time() {
        let mut s = Session::new(0);
        let mut d = RecordingDelegate::new();
        process_line(&mut s, "garbage", 12_345, &mut d);
        assert_eq!(s.last_server_response_secs, 12);
    }

    // =========================================================================
    // Lists
    // =========================================================================

    #[test]
    fn roster_count_then_entries() {
        let mut s = Session::new(0);
        let (_, events) = run(&mut s, "RL2]\\[RGS 41}|{41}|{L]\\[Goat}|{3}|{S");
        assert_eq!(
            events,
            [
                E::RosterEntries(2),
                E::RosterEntry(
                    0,
                    RosterEntry { name: "RGS 41".into(), address: 41, length: Some('L') }
                ),
                E::RosterEntry(
                    1,
                    RosterEntry { name: "Goat".into(), address: 3, length: Some('S') }
                ),
            ]
        );
    }

    #[test]
    fn roster_stops_at_count() {
        let mut s = Session::new(0);
        let (_, events) = run(&mut s, "RL1]\\[A}|{1}|{S]\\[B}|{2}|{S");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn roster_short_of_count_reports_what_is_there() {
        let mut s = Session::new(0);
        let (_, events) = run(&mut s, "RL3]\\[A}|{1}|{S");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn turnout_entries_then_total() {
        let mut s = Session::new(0);
        let (_, events) = run(&mut s, "PTL]\\[LT12}|{Yard}|{2]\\[LT13}|{Main}|{4");
        assert_eq!(
            events,
            [
                E::TurnoutEntry(
                    0,
                    ListEntry { system_name: "LT12".into(), user_name: "Yard".into(), state: 2 }
                ),
                E::TurnoutEntry(
                    1,
                    ListEntry { system_name: "LT13".into(), user_name: "Main".into(), state: 4 }
                ),
                E::TurnoutEntries(2),
            ]
        );
    }

    #[test]
    fn route_list_ignores_trailing_separator() {
        let mut s = Session::new(0);
        let (_, events) = run(&mut s, "PRL]\\[IR1}|{Out}|{2]\\[");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], E::RouteEntries(1));
    }

    // =========================================================================
    // Add / remove / steal
    // =========================================================================

    #[test]
    fn address_added_trims() {
        let mut s = Session::new(0);
        let (_, events) = run(&mut s, "MT+L1234<;>RGS 41 ");
        assert_eq!(events, [E::AddressAdded(T, "L1234".into(), "RGS 41".into())]);
    }

    #[test]
    fn address_removed_requires_d_or_r() {
        let mut s = Session::new(0);
        let id = ThrottleId::new('0');
        assert_eq!(
            run(&mut s, "M0-L5<;>r").1,
            [E::AddressRemoved(id, "L5".into(), "r".into())]
        );
        assert_eq!(
            run(&mut s, "M0-L5<;>d").1,
            [E::AddressRemoved(id, "L5".into(), "d".into())]
        );
        assert!(run(&mut s, "M0-L5<;>x").1.is_empty());
    }

    #[test]
    fn steal_forwards_unconditionally() {
        let mut s = Session::new(0);
        let id = ThrottleId::new('1');
        assert_eq!(
            run(&mut s, "M1SL3<;>L3").1,
            [E::StealNeeded(id, "L3".into(), "L3".into())]
        );
        assert_eq!(
            run(&mut s, "M1SL3abcd").1,
            [E::StealNeeded(id, "L3abcd".into(), "".into())]
        );
    }

    // =========================================================================
    // Locomotive actions
    // =========================================================================

    #[test]
    fn action_without_selection_is_ignored() {
        let mut s = Session::new(0);
        let (changed, events) = run(&mut s, "MTA*<;>V50");
        assert!(!changed);
        assert!(events.is_empty());
        assert_eq!(s.throttles.speed(T), 0);
    }

    #[test]
    fn speed_is_clamped_and_cached() {
        let mut s = selected("L41");
        assert_eq!(run(&mut s, "MTAL41<;>V200").1, [E::Speed(T, 126)]);
        assert_eq!(s.throttles.speed(T), 126);
        assert_eq!(run(&mut s, "MTA*<;>V-5").1, [E::Speed(T, 0)]);
    }

    #[test]
    fn direction_updates_aggregate() {
        let mut s = selected("L41");
        assert_eq!(run(&mut s, "MTA*<;>R0").1, [E::Direction(T, Direction::Reverse)]);
        assert_eq!(s.throttles.direction(T), Direction::Reverse);
        // Wrong length is dropped
        assert!(run(&mut s, "MTA*<;>R10").1.is_empty());
    }

    #[test]
    fn speed_steps_filtering() {
        let mut s = selected("L41");
        assert_eq!(
            run(&mut s, "MTA*<;>s2").1,
            [E::SpeedSteps(T, SpeedSteps::Steps28)]
        );
        assert!(run(&mut s, "MTA*<;>s3").1.is_empty());
        assert_eq!(s.throttles.speed_steps(T), Some(SpeedSteps::Steps28));
    }

    #[test]
    fn function_state() {
        let mut s = selected("S3");
        assert_eq!(run(&mut s, "MTAS3<;>F112").1, [E::FunctionState(T, 12, true)]);
        assert_eq!(run(&mut s, "MTAS3<;>F00").1, [E::FunctionState(T, 0, false)]);
        assert!(run(&mut s, "MTAS3<;>F1x").1.is_empty());
    }

    #[test]
    fn function_labels_are_padded() {
        let mut s = selected("L41");
        let (changed, events) = run(&mut s, "MTLL41<;>]\\[Headlight]\\[Bell]\\[Whistle");
        assert!(changed);
        let [E::FunctionList(id, labels)] = events.as_slice() else {
            panic!("expected one function list, got {events:?}");
        };
        assert_eq!(*id, T);
        assert_eq!(labels[0], "Headlight");
        assert_eq!(labels[2], "Whistle");
        assert!(labels[3..].iter().all(String::is_empty));
    }

    #[test]
    fn multi_throttle_ids_route_to_their_slot() {
        let mut s = Session::new(0);
        let mut queue = OutboundQueue::new(0, 0);
        let two = ThrottleId::new('2');
        s.throttles.add_locomotive(two, "L7", 0, &mut queue).unwrap();

        assert_eq!(run(&mut s, "M2A*<;>V10").1, [E::Speed(two, 10)]);
        assert_eq!(s.throttles.speed(two), 10);
        assert_eq!(s.throttles.speed(T), 0);
    }

    // =========================================================================
    // Accessories
    // =========================================================================

    #[test]
    fn turnout_action_keeps_full_name() {
        let mut s = Session::new(0);
        assert_eq!(
            run(&mut s, "PTA2LT12").1,
            [E::TurnoutAction("LT12".into(), TurnoutState::Closed)]
        );
        assert_eq!(
            run(&mut s, "PTA4LT12 \t").1,
            [E::TurnoutAction("LT12".into(), TurnoutState::Thrown)]
        );
    }

    #[test]
    fn route_action() {
        let mut s = Session::new(0);
        assert_eq!(
            run(&mut s, "PRA2IR:1").1,
            [E::RouteAction("IR:1".into(), RouteState::Active)]
        );
        assert_eq!(
            run(&mut s, "PRA4IR:1").1,
            [E::RouteAction("IR:1".into(), RouteState::Inactive)]
        );
    }
}
