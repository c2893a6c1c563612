//! Wire-level helpers: separators, tokenizing, lenient number parsing, and
//! the outbound command vocabulary.
//!
//! # Separators
//!
//! WiThrottle fields are delimited by three-character tokens:
//!
//! | Token | Name | Used for |
//! |-------|------|----------|
//! | `<;>` | property | address / payload splits |
//! | `]\[` | entry | list entries |
//! | `}\|{` | segment | fields inside a list entry |
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::wire::{split, ENTRY_SEPARATOR};
//!
//! let parts: Vec<&str> = split("a]\\[b]\\[c", ENTRY_SEPARATOR).collect();
//! assert_eq!(parts, ["a", "b", "c"]);
//! ```

use core::fmt;

use crate::types::{Direction, SpeedSteps, ThrottleId, TrackPower, TurnoutAction};

/// Separates an address from its payload.
pub const PROPERTY_SEPARATOR: &str = "<;>";
/// Separates list entries.
pub const ENTRY_SEPARATOR: &str = "]\\[";
/// Separates fields inside a list entry.
pub const SEGMENT_SEPARATOR: &str = "}|{";
/// Address wildcard meaning every locomotive on a throttle.
pub const ALL_LOCOMOTIVES: &str = "*";

/// Lazy split of `input` on a multi-character delimiter.
///
/// Unlike `str::split` this is restartable via [`Split::remainder`] and
/// `Clone`, so a handler can peek at the count field and then walk the rest.
#[derive(Clone, Debug)]
pub struct Split<'a> {
    rest: Option<&'a str>,
    delimiter: &'a str,
}

/// Splits `input` on `delimiter`. An empty input yields one empty token.
pub fn split<'a>(input: &'a str, delimiter: &'a str) -> Split<'a> {
    Split {
        rest: Some(input),
        delimiter,
    }
}

impl<'a> Split<'a> {
    /// Text not yet yielded, or `None` once exhausted.
    pub fn remainder(&self) -> Option<&'a str> {
        self.rest
    }
}

impl<'a> Iterator for Split<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        if self.delimiter.is_empty() {
            self.rest = None;
            return Some(rest);
        }
        match rest.find(self.delimiter) {
            Some(at) => {
                self.rest = Some(&rest[at + self.delimiter.len()..]);
                Some(&rest[..at])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Splits once on the property separator: `("L3<;>x")` → `("L3", Some("x"))`.
pub fn split_property(input: &str) -> (&str, Option<&str>) {
    match input.find(PROPERTY_SEPARATOR) {
        Some(at) => (&input[..at], Some(&input[at + PROPERTY_SEPARATOR.len()..])),
        None => (input, None),
    }
}

/// Parses an optionally signed run of leading digits, ignoring anything after.
///
/// Leading whitespace is skipped. Returns `None` when there are no digits.
/// Saturates instead of overflowing.
///
/// ```
/// use rs_withrottle::wire::leading_int;
///
/// assert_eq!(leading_int("126"), Some(126));
/// assert_eq!(leading_int("-1"), Some(-1));
/// assert_eq!(leading_int("12abc"), Some(12));
/// assert_eq!(leading_int("abc"), None);
/// ```
pub fn leading_int(input: &str) -> Option<i32> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].bytes().fold(0i64, |acc, b| {
        (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1)
    });
    let value = if negative { -magnitude } else { magnitude };
    Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Parses a leading decimal number such as `4.0` or `-2.5x`. `None` when
/// nothing numeric is present.
pub fn leading_float(input: &str) -> Option<f32> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

/// Every command the client sends to a server.
///
/// `Display` produces the wire text without a line terminator.
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundCommand<'a> {
    /// `N<name>`
    DeviceName(&'a str),
    /// `HU<id>`
    DeviceId(&'a str),
    /// `*+` or `*-`
    RequireHeartbeat(bool),
    /// `*`
    KeepAlive,
    /// `M<id>+<addr><;><addr>`
    Acquire {
        /// Target throttle.
        throttle: ThrottleId,
        /// Locomotive address.
        address: &'a str,
    },
    /// `M<id>-<addr><;>r`
    Release {
        /// Target throttle.
        throttle: ThrottleId,
        /// Locomotive address or `*`.
        address: &'a str,
    },
    /// `M<id>A*<;>V<n>`
    Speed {
        /// Target throttle.
        throttle: ThrottleId,
        /// Speed, 0..=126.
        speed: u8,
    },
    /// `M<id>A<addr><;>R<0|1>`
    Direction {
        /// Target throttle.
        throttle: ThrottleId,
        /// Locomotive address or `*`.
        address: &'a str,
        /// New direction.
        direction: Direction,
    },
    /// `M<id>A<addr><;>F<0|1><n>`
    Function {
        /// Target throttle.
        throttle: ThrottleId,
        /// Locomotive address.
        address: &'a str,
        /// Function number.
        number: u8,
        /// Pressed (`1`) or released (`0`).
        pressed: bool,
    },
    /// `M<id>A*<;>s<n>`
    SpeedSteps {
        /// Target throttle.
        throttle: ThrottleId,
        /// Step mode.
        steps: SpeedSteps,
    },
    /// `M<id>A<addr><;>X`
    EmergencyStop {
        /// Target throttle.
        throttle: ThrottleId,
        /// Locomotive address or `*`.
        address: &'a str,
    },
    /// `PPA<n>`
    TrackPower(TrackPower),
    /// `PTA<action><name>`
    Turnout {
        /// Turnout system name.
        name: &'a str,
        /// Requested action.
        action: TurnoutAction,
    },
    /// `PRA2<name>`
    Route(&'a str),
    /// `Q`
    Quit,
}

impl fmt::Display for OutboundCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SEP: &str = PROPERTY_SEPARATOR;
        match self {
            OutboundCommand::DeviceName(name) => write!(f, "N{name}"),
            OutboundCommand::DeviceId(id) => write!(f, "HU{id}"),
            OutboundCommand::RequireHeartbeat(true) => f.write_str("*+"),
            OutboundCommand::RequireHeartbeat(false) => f.write_str("*-"),
            OutboundCommand::KeepAlive => f.write_str("*"),
            OutboundCommand::Acquire { throttle, address } => {
                write!(f, "M{throttle}+{address}{SEP}{address}")
            }
            OutboundCommand::Release { throttle, address } => {
                write!(f, "M{throttle}-{address}{SEP}r")
            }
            OutboundCommand::Speed { throttle, speed } => {
                write!(f, "M{throttle}A{ALL_LOCOMOTIVES}{SEP}V{speed}")
            }
            OutboundCommand::Direction {
                throttle,
                address,
                direction,
            } => write!(f, "M{throttle}A{address}{SEP}R{}", direction.as_wire()),
            OutboundCommand::Function {
                throttle,
                address,
                number,
                pressed,
            } => write!(
                f,
                "M{throttle}A{address}{SEP}F{}{number}",
                if *pressed { '1' } else { '0' }
            ),
            OutboundCommand::SpeedSteps { throttle, steps } => {
                write!(f, "M{throttle}A{ALL_LOCOMOTIVES}{SEP}s{}", steps.code())
            }
            OutboundCommand::EmergencyStop { throttle, address } => {
                write!(f, "M{throttle}A{address}{SEP}X")
            }
            OutboundCommand::TrackPower(state) => write!(f, "PPA{}", state.as_wire()),
            OutboundCommand::Turnout { name, action } => {
                write!(f, "PTA{}{name}", action.as_wire())
            }
            OutboundCommand::Route(name) => write!(f, "PRA2{name}"),
            OutboundCommand::Quit => f.write_str("Q"),
        }
    }
}
