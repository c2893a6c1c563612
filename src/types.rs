//! Protocol value types shared by the dispatcher, throttle table, and delegate.
//!
//! Most of these map one-to-one onto a code that appears on the wire. The
//! mapping lives next to the type (`from_wire` / `as_wire`) so the dispatcher
//! and the outbound encoder never repeat it.

use alloc::string::String;

/// Maximum number of function labels carried by a roster function list.
pub const MAX_FUNCTIONS: usize = 32;

/// Number of independent throttle slots.
pub const MAX_THROTTLES: usize = 6;

/// Fixed-size set of function labels, blank-padded past the received count.
pub type FunctionLabels = [String; MAX_FUNCTIONS];

/// Direction of travel for a throttle or a single locomotive in a consist.
///
/// # Default
///
/// Defaults to [`Forward`](Self::Forward), which is what a freshly acquired
/// locomotive faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Running in reverse (`R0`).
    Reverse,
    /// Running forward (`R1`).
    #[default]
    Forward,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_withrottle::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }

    /// Wire digit used in `R<digit>` payloads.
    #[inline]
    pub const fn as_wire(&self) -> char {
        match self {
            Direction::Reverse => '0',
            Direction::Forward => '1',
        }
    }

    /// Decodes the digit of an `R<digit>` payload.
    ///
    /// Only `'0'` means reverse; every other character is forward.
    #[inline]
    pub const fn from_wire(c: char) -> Self {
        if c == '0' {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

/// Track power state reported by `PPA<n>` or requested by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrackPower {
    /// Power is off.
    Off,
    /// Power is on.
    On,
    /// The server does not know.
    Unknown,
}

impl TrackPower {
    /// Decodes the first payload character of a `PPA` line.
    pub const fn from_wire(c: char) -> Self {
        match c {
            '0' => TrackPower::Off,
            '1' => TrackPower::On,
            _ => TrackPower::Unknown,
        }
    }

    /// Wire digit for `PPA<digit>`.
    pub const fn as_wire(&self) -> char {
        match self {
            TrackPower::Off => '0',
            TrackPower::On => '1',
            TrackPower::Unknown => '2',
        }
    }
}

/// Turnout state as reported by the server (`PTA<code><name>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TurnoutState {
    /// Code `1`, or any unrecognised code.
    Unknown,
    /// Code `2`.
    Closed,
    /// Code `4`.
    Thrown,
    /// Code `8`.
    Inconsistent,
}

impl TurnoutState {
    /// Decodes a turnout state code.
    pub const fn from_wire(c: char) -> Self {
        match c {
            '2' => TurnoutState::Closed,
            '4' => TurnoutState::Thrown,
            '8' => TurnoutState::Inconsistent,
            _ => TurnoutState::Unknown,
        }
    }
}

/// Turnout action requested by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TurnoutAction {
    /// `PTAC<name>`
    Close,
    /// `PTAT<name>`
    Throw,
    /// `PTA2<name>`
    Toggle,
}

impl TurnoutAction {
    /// Wire character placed after `PTA`.
    pub const fn as_wire(&self) -> char {
        match self {
            TurnoutAction::Close => 'C',
            TurnoutAction::Throw => 'T',
            TurnoutAction::Toggle => '2',
        }
    }
}

/// Route state as reported by the server (`PRA<code><name>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RouteState {
    /// Code `2`.
    Active,
    /// Code `4`.
    Inactive,
    /// Any other code.
    Inconsistent,
}

impl RouteState {
    /// Decodes a route state code.
    pub const fn from_wire(c: char) -> Self {
        match c {
            '2' => RouteState::Active,
            '4' => RouteState::Inactive,
            _ => RouteState::Inconsistent,
        }
    }
}

/// DCC speed-step mode, encoded on the wire as a bit value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpeedSteps {
    /// 128 steps (`s1`).
    Steps128,
    /// 28 steps (`s2`).
    Steps28,
    /// 27 steps (`s4`).
    Steps27,
    /// 14 steps (`s8`).
    Steps14,
    /// 28 steps, Motorola (`s16`).
    Steps28Motorola,
}

impl SpeedSteps {
    /// Decodes a wire bit value. Anything outside {1, 2, 4, 8, 16} is `None`.
    ///
    /// ```
    /// use rs_withrottle::SpeedSteps;
    ///
    /// assert_eq!(SpeedSteps::from_code(2), Some(SpeedSteps::Steps28));
    /// assert_eq!(SpeedSteps::from_code(3), None);
    /// ```
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(SpeedSteps::Steps128),
            2 => Some(SpeedSteps::Steps28),
            4 => Some(SpeedSteps::Steps27),
            8 => Some(SpeedSteps::Steps14),
            16 => Some(SpeedSteps::Steps28Motorola),
            _ => None,
        }
    }

    /// Wire bit value.
    pub const fn code(&self) -> u8 {
        match self {
            SpeedSteps::Steps128 => 1,
            SpeedSteps::Steps28 => 2,
            SpeedSteps::Steps27 => 4,
            SpeedSteps::Steps14 => 8,
            SpeedSteps::Steps28Motorola => 16,
        }
    }
}

/// One-character multi-throttle identifier as it appears on the wire.
///
/// `'T'` is the legacy default throttle and shares slot 0 with `'0'`. Any
/// character outside `'0'..='5'` also resolves to slot 0, matching how
/// servers treat unknown ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrottleId(char);

impl ThrottleId {
    /// The legacy single-throttle id, `'T'`.
    pub const DEFAULT: ThrottleId = ThrottleId('T');

    /// Wraps a raw id character without validation.
    pub const fn new(c: char) -> Self {
        Self(c)
    }

    /// Id for a numbered slot (`'0'..='5'`). Out-of-range indices wrap to `'0'`.
    pub fn from_slot(index: usize) -> Self {
        if index < MAX_THROTTLES {
            Self((b'0' + index as u8) as char)
        } else {
            Self('0')
        }
    }

    /// The raw id character.
    pub const fn as_char(&self) -> char {
        self.0
    }

    /// True for the legacy `'T'` id.
    pub const fn is_default(&self) -> bool {
        self.0 == 'T'
    }

    /// Slot index this id addresses.
    ///
    /// ```
    /// use rs_withrottle::ThrottleId;
    ///
    /// assert_eq!(ThrottleId::new('T').slot_index(), 0);
    /// assert_eq!(ThrottleId::new('3').slot_index(), 3);
    /// assert_eq!(ThrottleId::new('9').slot_index(), 0);
    /// ```
    pub const fn slot_index(&self) -> usize {
        match self.0 {
            c @ '0'..='5' => c as usize - '0' as usize,
            _ => 0,
        }
    }
}

impl Default for ThrottleId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<char> for ThrottleId {
    fn from(c: char) -> Self {
        Self(c)
    }
}

impl core::fmt::Display for ThrottleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the server's locomotive roster (`RL` line).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterEntry {
    /// Roster name.
    pub name: String,
    /// Numeric DCC address.
    pub address: i32,
    /// Address length code, `'S'` or `'L'`; `None` when the field was empty.
    pub length: Option<char>,
}

/// One entry of a turnout (`PTL`) or route (`PRL`) list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListEntry {
    /// System name, e.g. `LT12`.
    pub system_name: String,
    /// User-facing name.
    pub user_name: String,
    /// Raw numeric state code.
    pub state: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_default_is_forward() {
        assert_eq!(Direction::default(), Direction::Forward);
    }

    #[test]
    fn direction_wire_round_trip() {
        assert_eq!(Direction::from_wire('0'), Direction::Reverse);
        assert_eq!(Direction::from_wire('1'), Direction::Forward);
        assert_eq!(Direction::from_wire('x'), Direction::Forward);
        assert_eq!(Direction::Reverse.as_wire(), '0');
    }

    #[test]
    fn track_power_codes() {
        assert_eq!(TrackPower::from_wire('0'), TrackPower::Off);
        assert_eq!(TrackPower::from_wire('1'), TrackPower::On);
        assert_eq!(TrackPower::from_wire('2'), TrackPower::Unknown);
        assert_eq!(TrackPower::from_wire('z'), TrackPower::Unknown);
    }

    #[test]
    fn turnout_and_route_codes() {
        assert_eq!(TurnoutState::from_wire('2'), TurnoutState::Closed);
        assert_eq!(TurnoutState::from_wire('4'), TurnoutState::Thrown);
        assert_eq!(TurnoutState::from_wire('8'), TurnoutState::Inconsistent);
        assert_eq!(TurnoutState::from_wire('1'), TurnoutState::Unknown);
        assert_eq!(RouteState::from_wire('2'), RouteState::Active);
        assert_eq!(RouteState::from_wire('4'), RouteState::Inactive);
        assert_eq!(RouteState::from_wire('8'), RouteState::Inconsistent);
    }

    #[test]
    fn speed_steps_only_accepts_bit_values() {
        for code in [1, 2, 4, 8, 16] {
            let steps = SpeedSteps::from_code(code).unwrap();
            assert_eq!(steps.code() as i32, code);
        }
        for code in [0, 3, 5, 32, -1] {
            assert_eq!(SpeedSteps::from_code(code), None);
        }
    }

    #[test]
    fn throttle_id_slot_index() {
        assert_eq!(ThrottleId::new('T').slot_index(), 0);
        for (i, c) in ('0'..='5').enumerate() {
            assert_eq!(ThrottleId::new(c).slot_index(), i);
        }
        assert_eq!(ThrottleId::new('6').slot_index(), 0);
        assert_eq!(ThrottleId::new('A').slot_index(), 0);
        assert_eq!(ThrottleId::new('/').slot_index(), 0);
    }

    #[test]
    fn throttle_id_from_slot() {
        assert_eq!(ThrottleId::from_slot(4).as_char(), '4');
        assert_eq!(ThrottleId::from_slot(9).as_char(), '0');
        assert!(ThrottleId::DEFAULT.is_default());
        assert!(!ThrottleId::from_slot(0).is_default());
    }
}
