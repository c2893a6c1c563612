//! Edge case and malformed-input tests for the protocol engine

use proptest::prelude::*;
use rs_withrottle::framer::MAX_LINE_LENGTH;
use rs_withrottle::hal::{DelegateEvent as E, MockTransport, RecordingDelegate};
use rs_withrottle::{
    CommandError, Direction, ListEntry, ProtocolConfig, RouteState, ThrottleId, TrackPower,
    TurnoutState, WiThrottle,
};

const T: ThrottleId = ThrottleId::DEFAULT;

fn client() -> WiThrottle<MockTransport> {
    let mut wit = WiThrottle::new(ProtocolConfig::default().with_min_command_delay_ms(0));
    wit.connect(MockTransport::new(), 0);
    wit
}

fn events_for(wit: &mut WiThrottle<MockTransport>, input: &str) -> Vec<E> {
    let mut delegate = RecordingDelegate::new();
    wit.transport_mut().unwrap().feed(input);
    wit.check(0, &mut delegate).unwrap();
    delegate.events
}

fn drain(wit: &mut WiThrottle<MockTransport>, from_ms: u64) -> Vec<String> {
    let mut now = from_ms;
    while wit.queued_commands().next().is_some() {
        wit.check(now, &mut ()).unwrap();
        now += 1;
    }
    wit.transport_mut().unwrap().take_sent_lines()
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn overlong_line_is_dropped_and_stream_resyncs() {
    let mut wit = client();
    let mut input = "A".repeat(MAX_LINE_LENGTH);
    input.push_str("\nPPA1\n");

    assert_eq!(events_for(&mut wit, &input), [E::TrackPower(TrackPower::On)]);
}

#[test]
fn mixed_terminators() {
    let mut wit = client();
    let events = events_for(&mut wit, "PPA0\r\n\r\nPPA1\r\r");
    assert_eq!(
        events,
        [E::TrackPower(TrackPower::Off), E::TrackPower(TrackPower::On)]
    );
}

#[test]
fn line_split_across_polls() {
    let mut wit = client();
    assert!(events_for(&mut wit, "VN2").is_empty());
    assert_eq!(events_for(&mut wit, ".0\n"), [E::Version("2.0".into())]);
}

#[test]
fn non_utf8_line_is_still_dispatched() {
    let mut wit = client();
    let mut delegate = RecordingDelegate::new();
    wit.transport_mut()
        .unwrap()
        .incoming
        .extend(b"HtZ\xfcrich\n".iter().copied());
    wit.check(42_000, &mut delegate).unwrap();

    assert_eq!(
        delegate.take(),
        [E::ServerDescription("Z\u{fffd}rich".into())]
    );
    assert_eq!(wit.last_server_response_secs(), 42);
}

// ============================================================================
// Noise and unknown input
// ============================================================================

#[test]
fn noise_preamble_and_vendor_commands_are_discarded() {
    let mut wit = client();
    let events = events_for(
        &mut wit,
        "AT+CIPSENDBUF=AT+CIPSENDBUF=PPA1\nAT+CIPSEND=0,12\nAT+CIPSENDBUF=\n",
    );
    assert_eq!(events, [E::TrackPower(TrackPower::On)]);
}

#[test]
fn unknown_lines_reach_the_delegate() {
    let mut wit = client();
    assert_eq!(
        events_for(&mut wit, "XYZZY\n"),
        [E::UnknownCommand("XYZZY".into())]
    );
}

#[test]
fn actions_without_selection_are_ignored() {
    let mut wit = client();
    assert!(events_for(&mut wit, "MTAL3<;>V10\nMTL*<;>]\\[Light\n").is_empty());
    assert_eq!(wit.speed(T), 0);
}

#[test]
fn add_without_separator_is_dropped() {
    let mut wit = client();
    assert!(events_for(&mut wit, "MT+L1234\n").is_empty());
}

#[test]
fn steal_is_always_forwarded() {
    let mut wit = client();
    assert_eq!(
        events_for(&mut wit, "MTSL1234<;>L1234\n"),
        [E::StealNeeded(T, "L1234".into(), "L1234".into())]
    );
}

// ============================================================================
// Lists and accessories
// ============================================================================

#[test]
fn turnout_list_ignores_trailing_separator() {
    let mut wit = client();
    let events = events_for(&mut wit, "PTL]\\[LT1}|{Yard}|{2]\\[LT2}|{}|{4]\\[\n");
    assert_eq!(
        events,
        [
            E::TurnoutEntry(
                0,
                ListEntry {
                    system_name: "LT1".into(),
                    user_name: "Yard".into(),
                    state: 2,
                }
            ),
            E::TurnoutEntry(
                1,
                ListEntry {
                    system_name: "LT2".into(),
                    user_name: String::new(),
                    state: 4,
                }
            ),
            E::TurnoutEntries(2),
        ]
    );
}

#[test]
fn route_list_with_single_entry() {
    let mut wit = client();
    let events = events_for(&mut wit, "PRL]\\[IR:AUTO:0001}|{Main}|{2\n");
    assert_eq!(
        events,
        [
            E::RouteEntry(
                0,
                ListEntry {
                    system_name: "IR:AUTO:0001".into(),
                    user_name: "Main".into(),
                    state: 2,
                }
            ),
            E::RouteEntries(1),
        ]
    );
}

#[test]
fn accessory_state_codes() {
    let mut wit = client();
    let events = events_for(&mut wit, "PTA1LT5\nPTA8LT6\nPRA4IR1\nPRA9IR2\n");
    assert_eq!(
        events,
        [
            E::TurnoutAction("LT5".into(), TurnoutState::Unknown),
            E::TurnoutAction("LT6".into(), TurnoutState::Inconsistent),
            E::RouteAction("IR1".into(), RouteState::Inactive),
            E::RouteAction("IR2".into(), RouteState::Inconsistent),
        ]
    );
}

// ============================================================================
// Throttle mutation API
// ============================================================================

#[test]
fn address_must_be_short_or_long() {
    let mut wit = client();
    assert_eq!(wit.add_locomotive(T, "1234"), Err(CommandError::InvalidAddress));
    assert_eq!(wit.add_locomotive(T, ""), Err(CommandError::InvalidAddress));
    assert!(!wit.is_selected(T));
    assert_eq!(wit.queued_commands().count(), 0);
}

#[test]
fn commands_need_a_selection() {
    let mut wit = client();
    let t = ThrottleId::new('4');
    assert_eq!(wit.set_speed(t, 10, false), Err(CommandError::NotSelected(t)));
    assert_eq!(
        wit.set_direction(t, "*", Direction::Reverse, false),
        Err(CommandError::NotSelected(t))
    );
    assert_eq!(
        wit.set_function(t, None, 0, true),
        Err(CommandError::NotSelected(t))
    );
}

#[test]
fn function_number_bounds() {
    let mut wit = client();
    wit.add_locomotive(T, "L3").unwrap();
    assert_eq!(
        wit.set_function(T, None, 32, true),
        Err(CommandError::FunctionOutOfRange(32))
    );
    wit.set_function(T, None, 31, true).unwrap();
    wit.set_function(T, Some(""), 0, false).unwrap();

    assert_eq!(
        drain(&mut wit, 0),
        ["MT+L3<;>L3", "MTAL3<;>F131", "MTAL3<;>F00"]
    );
}

#[test]
fn unchanged_speed_is_not_resent() {
    let mut wit = client();
    wit.add_locomotive(T, "L3").unwrap();
    wit.set_speed(T, 40, false).unwrap();
    wit.set_speed(T, 40, false).unwrap();
    wit.set_speed(T, 40, true).unwrap();

    assert_eq!(
        drain(&mut wit, 0),
        ["MT+L3<;>L3", "MTA*<;>V40", "MTA*<;>V40"]
    );
}

#[test]
fn per_locomotive_direction_in_consist() {
    let mut wit = client();
    wit.add_locomotive(T, "L10").unwrap();
    wit.add_locomotive(T, "L20").unwrap();
    wit.set_direction(T, "L20", Direction::Reverse, false).unwrap();

    assert_eq!(wit.direction_of(T, "L10"), Direction::Forward);
    assert_eq!(wit.direction_of(T, "L20"), Direction::Reverse);
    assert_eq!(wit.direction(T), Direction::Forward);
    assert_eq!(wit.locomotive_at(T, 1), Some("L20"));
    assert_eq!(wit.locomotive_at(T, 2), None);
}

#[test]
fn releasing_lead_promotes_next() {
    let mut wit = client();
    wit.add_locomotive(T, "L10").unwrap();
    wit.add_locomotive(T, "L20").unwrap();
    wit.release_locomotive(T, "L10");

    assert_eq!(wit.lead_locomotive(T), Some("L20"));
    assert_eq!(wit.number_of_locomotives(T), 1);
}

#[test]
fn default_and_zero_share_a_slot() {
    let mut wit = client();
    wit.add_locomotive(ThrottleId::new('0'), "S3").unwrap();
    assert!(wit.is_selected(T));
    assert_eq!(wit.lead_locomotive(ThrottleId::new('7')), Some("S3"));
}

#[test]
fn emergency_stop_zeroes_speed() {
    let mut wit = client();
    wit.add_locomotive(T, "L3").unwrap();
    wit.set_speed(T, 80, false).unwrap();
    wit.emergency_stop(T, "*");

    assert_eq!(wit.speed(T), 0);
    assert_eq!(
        drain(&mut wit, 0),
        ["MT+L3<;>L3", "MTA*<;>V80", "MTA*<;>V0", "MTA*<;>X"]
    );
}

#[test]
fn steal_releases_then_acquires() {
    let mut wit = client();
    wit.steal_locomotive(T, "L3").unwrap();
    assert_eq!(drain(&mut wit, 0), ["MT-L3<;>r", "MT+L3<;>L3"]);
    assert_eq!(wit.lead_locomotive(T), Some("L3"));
}

// ============================================================================
// Fast clock
// ============================================================================

#[test]
fn fast_clock_runs_between_updates() {
    let mut wit = client();
    events_for(&mut wit, "PFT1000<;>4.0\n");
    assert!(wit.clock_changed());
    assert_eq!(wit.fast_time_rate(), 4.0);

    wit.check(999, &mut ()).unwrap();
    assert_eq!(wit.current_fast_time(), 1000.0);
    assert!(!wit.clock_changed());

    wit.check(1_000, &mut ()).unwrap();
    assert_eq!(wit.current_fast_time(), 1004.0);
    assert!(wit.clock_changed());
}

#[test]
fn frozen_fast_clock_reports_no_change() {
    let mut wit = client();
    events_for(&mut wit, "PFT500<;>0.0\n");
    assert_eq!(wit.check(1_000, &mut ()), Ok(false));
    assert_eq!(wit.current_fast_time(), 500.0);
}

#[test]
fn malformed_fast_time_keeps_running_clock() {
    let mut wit = client();
    events_for(&mut wit, "PFT1000<;>4.0\n");
    assert!(events_for(&mut wit, "PFTxyz<;>?\n").is_empty());
    assert!(!wit.clock_changed());
    assert_eq!(wit.current_fast_time(), 1000.0);
    assert_eq!(wit.fast_time_rate(), 4.0);

    wit.check(1_000, &mut ()).unwrap();
    assert_eq!(wit.current_fast_time(), 1004.0);
}

// ============================================================================
// Heartbeat
// ============================================================================

#[test]
fn malformed_heartbeat_keeps_keepalive() {
    let mut wit = client();
    events_for(&mut wit, "*10\n");
    assert!(events_for(&mut wit, "*abc\n").is_empty());
    assert_eq!(wit.heartbeat_period(), 10);

    wit.check(5_000, &mut ()).unwrap();
    assert_eq!(wit.transport_mut().unwrap().take_sent_lines(), ["*"]);
}

// ============================================================================
// Robustness
// ============================================================================

proptest! {
    #[test]
    fn arbitrary_input_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut wit = client();
        wit.add_locomotive(T, "L3").unwrap();
        let mut delegate = RecordingDelegate::new();
        wit.transport_mut().unwrap().incoming.extend(bytes);
        prop_assert!(wit.check(0, &mut delegate).is_ok());
        prop_assert!(wit.speed(T) <= 126);
    }

    #[test]
    fn protocol_like_lines_never_panic(
        lines in proptest::collection::vec("(M[T0-9][AL+\\-S]|PTA|PRA|PFT|PTL|PRL|RL|\\*)[ -~]{0,40}", 0..20)
    ) {
        let mut wit = client();
        wit.add_locomotive(ThrottleId::new('3'), "S3").unwrap();
        let mut delegate = RecordingDelegate::new();
        let input = lines.join("\n") + "\n";
        wit.transport_mut().unwrap().feed(&input);
        prop_assert!(wit.check(0, &mut delegate).is_ok());
        prop_assert!(wit.speed(ThrottleId::new('3')) <= 126);
    }
}
