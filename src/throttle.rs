//! Per-throttle state and the outbound mutation API.
//!
//! The client drives up to six independent throttles. Each holds a consist:
//! an ordered list of locomotives where the first entry is the lead. Speed,
//! aggregate direction, and speed-step mode are cached per throttle so that
//! requests only go on the wire when something actually changes.
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::throttle::ThrottleTable;
//! use rs_withrottle::queue::OutboundQueue;
//! use rs_withrottle::ThrottleId;
//!
//! let mut table = ThrottleTable::new();
//! let mut queue = OutboundQueue::new(0, 0);
//! let t = ThrottleId::DEFAULT;
//!
//! table.add_locomotive(t, "L1234", 0, &mut queue).unwrap();
//! table.set_speed(t, 40, false, &mut queue).unwrap();
//!
//! assert_eq!(table.lead_locomotive(t), Some("L1234"));
//! assert_eq!(table.speed(t), 40);
//! assert_eq!(queue.len(), 2);
//! ```
//!
//! # Throttle ids
//!
//! Every method takes a [`ThrottleId`]. Ids resolve to slots through
//! [`ThrottleId::slot_index`], so `'T'`, `'0'`, and unknown ids all share
//! slot 0. The id itself is still what goes on the wire.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use log::debug;

use crate::error::CommandError;
use crate::queue::OutboundQueue;
use crate::types::{Direction, SpeedSteps, ThrottleId, MAX_FUNCTIONS, MAX_THROTTLES};
use crate::wire::{OutboundCommand, ALL_LOCOMOTIVES};

/// Highest speed value the protocol carries.
pub const MAX_SPEED: u8 = 126;

/// One locomotive in a consist.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocomotiveEntry {
    /// `S<digits>` or `L<digits>`.
    pub address: String,
    /// Which way this locomotive faces within the consist.
    pub facing: Direction,
}

/// State of a single throttle.
///
/// The throttle counts as selected exactly when its roster is non-empty, and
/// the lead is always the roster front, so neither is stored separately.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrottleSlot {
    roster: Vec<LocomotiveEntry>,
    speed: u8,
    direction: Direction,
    speed_steps: Option<SpeedSteps>,
    last_acquired_ms: Option<u64>,
}

impl ThrottleSlot {
    /// True when at least one locomotive is assigned.
    pub fn is_selected(&self) -> bool {
        !self.roster.is_empty()
    }

    /// Lead locomotive address.
    pub fn lead(&self) -> Option<&str> {
        self.roster.first().map(|e| e.address.as_str())
    }

    /// Consist in order, lead first.
    pub fn roster(&self) -> &[LocomotiveEntry] {
        &self.roster
    }

    /// Cached speed, 0..=126.
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Cached aggregate direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Cached speed-step mode, if the server has reported one.
    pub fn speed_steps(&self) -> Option<SpeedSteps> {
        self.speed_steps
    }

    /// When a locomotive was last added to this throttle.
    pub fn last_acquired_ms(&self) -> Option<u64> {
        self.last_acquired_ms
    }

    fn position(&self, address: &str) -> Option<usize> {
        self.roster.iter().position(|e| e.address == address)
    }

    /// Stores a speed reported by the server, clamped into range.
    pub(crate) fn record_speed(&mut self, speed: i32) -> u8 {
        self.speed = speed.clamp(0, i32::from(MAX_SPEED)) as u8;
        self.speed
    }

    pub(crate) fn record_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub(crate) fn record_speed_steps(&mut self, steps: SpeedSteps) {
        self.speed_steps = Some(steps);
    }
}

/// The six throttle slots.
#[derive(Clone, Debug, Default)]
pub struct ThrottleTable {
    slots: [ThrottleSlot; MAX_THROTTLES],
}

impl ThrottleTable {
    /// Creates a table with every throttle empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the slot an id resolves to.
    pub fn slot(&self, throttle: ThrottleId) -> &ThrottleSlot {
        &self.slots[throttle.slot_index()]
    }

    pub(crate) fn slot_mut(&mut self, throttle: ThrottleId) -> &mut ThrottleSlot {
        &mut self.slots[throttle.slot_index()]
    }

    /// Iterates slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ThrottleSlot> {
        self.slots.iter()
    }

    /// Most recent acquisition across all throttles.
    pub fn last_acquired_ms(&self) -> Option<u64> {
        self.slots.iter().filter_map(|s| s.last_acquired_ms).max()
    }

    /// Empties every throttle.
    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// True when the throttle has a locomotive.
    pub fn is_selected(&self, throttle: ThrottleId) -> bool {
        self.slot(throttle).is_selected()
    }

    /// Lead locomotive of the throttle.
    pub fn lead_locomotive(&self, throttle: ThrottleId) -> Option<&str> {
        self.slot(throttle).lead()
    }

    /// Locomotive at `position` in the consist.
    pub fn locomotive_at(&self, throttle: ThrottleId, position: usize) -> Option<&str> {
        self.slot(throttle)
            .roster
            .get(position)
            .map(|e| e.address.as_str())
    }

    /// Consist length.
    pub fn number_of_locomotives(&self, throttle: ThrottleId) -> usize {
        self.slot(throttle).roster.len()
    }

    /// Cached speed.
    pub fn speed(&self, throttle: ThrottleId) -> u8 {
        self.slot(throttle).speed
    }

    /// Cached aggregate direction.
    pub fn direction(&self, throttle: ThrottleId) -> Direction {
        self.slot(throttle).direction
    }

    /// Facing of one locomotive; falls back to the aggregate direction for
    /// `*` or an address not in the consist.
    pub fn direction_of(&self, throttle: ThrottleId, address: &str) -> Direction {
        let slot = self.slot(throttle);
        if address == ALL_LOCOMOTIVES {
            return slot.direction;
        }
        slot.position(address)
            .map(|i| slot.roster[i].facing)
            .unwrap_or(slot.direction)
    }

    /// Cached speed-step mode.
    pub fn speed_steps(&self, throttle: ThrottleId) -> Option<SpeedSteps> {
        self.slot(throttle).speed_steps
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Requests a locomotive and adds it to the consist.
    ///
    /// The acquire command is queued even if the address is already in the
    /// consist; the consist itself never holds duplicates.
    pub fn add_locomotive(
        &mut self,
        throttle: ThrottleId,
        address: &str,
        now_ms: u64,
        queue: &mut OutboundQueue,
    ) -> Result<(), CommandError> {
        if !matches!(address.as_bytes().first(), Some(b'S') | Some(b'L')) {
            return Err(CommandError::InvalidAddress);
        }
        queue.enqueue(OutboundCommand::Acquire { throttle, address }.to_string());

        let slot = self.slot_mut(throttle);
        if slot.position(address).is_none() {
            slot.roster.push(LocomotiveEntry {
                address: address.into(),
                facing: Direction::Forward,
            });
            slot.last_acquired_ms = Some(now_ms);
            debug!("throttle {throttle}: added {address} ({} in consist)", slot.roster.len());
        }
        Ok(())
    }

    /// Releases `address` (or every locomotive for `*`) and then re-acquires it.
    pub fn steal_locomotive(
        &mut self,
        throttle: ThrottleId,
        address: &str,
        now_ms: u64,
        queue: &mut OutboundQueue,
    ) -> Result<(), CommandError> {
        self.release_locomotive(throttle, address, queue);
        self.add_locomotive(throttle, address, now_ms, queue)
    }

    /// Releases one locomotive, or the whole consist for `*`.
    pub fn release_locomotive(
        &mut self,
        throttle: ThrottleId,
        address: &str,
        queue: &mut OutboundQueue,
    ) {
        queue.enqueue(OutboundCommand::Release { throttle, address }.to_string());

        let slot = self.slot_mut(throttle);
        if address == ALL_LOCOMOTIVES {
            slot.roster.clear();
        } else if let Some(i) = slot.position(address) {
            slot.roster.remove(i);
        }
        debug!("throttle {throttle}: released {address} ({} left)", slot.roster.len());
    }

    /// Sets the throttle speed.
    ///
    /// Only queues a command when the value differs from the cache or
    /// `force` is set.
    pub fn set_speed(
        &mut self,
        throttle: ThrottleId,
        speed: i32,
        force: bool,
        queue: &mut OutboundQueue,
    ) -> Result<(), CommandError> {
        let speed = u8::try_from(speed)
            .ok()
            .filter(|s| *s <= MAX_SPEED)
            .ok_or(CommandError::InvalidSpeed(speed))?;
        let slot = self.slot_mut(throttle);
        if !slot.is_selected() {
            return Err(CommandError::NotSelected(throttle));
        }
        if speed != slot.speed || force {
            queue.enqueue(OutboundCommand::Speed { throttle, speed }.to_string());
            slot.speed = speed;
        }
        Ok(())
    }

    /// Sets the direction of the whole consist (`*`) or of one locomotive.
    ///
    /// The comparison for change detection uses the value being replaced:
    /// the aggregate direction for `*`, otherwise that locomotive's facing.
    pub fn set_direction(
        &mut self,
        throttle: ThrottleId,
        address: &str,
        direction: Direction,
        force: bool,
        queue: &mut OutboundQueue,
    ) -> Result<(), CommandError> {
        if !self.is_selected(throttle) {
            return Err(CommandError::NotSelected(throttle));
        }
        if direction == self.direction_of(throttle, address) && !force {
            return Ok(());
        }
        queue.enqueue(
            OutboundCommand::Direction {
                throttle,
                address,
                direction,
            }
            .to_string(),
        );

        let slot = self.slot_mut(throttle);
        if address == ALL_LOCOMOTIVES {
            slot.direction = direction;
        } else if let Some(i) = slot.position(address) {
            slot.roster[i].facing = direction;
        }
        Ok(())
    }

    /// Presses or releases a function. `None` targets the lead locomotive.
    pub fn set_function(
        &mut self,
        throttle: ThrottleId,
        address: Option<&str>,
        number: u8,
        pressed: bool,
        queue: &mut OutboundQueue,
    ) -> Result<(), CommandError> {
        let slot = self.slot(throttle);
        let Some(lead) = slot.lead() else {
            return Err(CommandError::NotSelected(throttle));
        };
        if usize::from(number) >= MAX_FUNCTIONS {
            return Err(CommandError::FunctionOutOfRange(number));
        }
        let address = address.filter(|a| !a.is_empty()).unwrap_or(lead);
        queue.enqueue(
            OutboundCommand::Function {
                throttle,
                address,
                number,
                pressed,
            }
            .to_string(),
        );
        Ok(())
    }

    /// Requests a speed-step mode for the consist and caches it.
    pub fn set_speed_steps(
        &mut self,
        throttle: ThrottleId,
        steps: SpeedSteps,
        queue: &mut OutboundQueue,
    ) -> Result<(), CommandError> {
        let slot = self.slot_mut(throttle);
        if !slot.is_selected() {
            return Err(CommandError::NotSelected(throttle));
        }
        queue.enqueue(OutboundCommand::SpeedSteps { throttle, steps }.to_string());
        slot.speed_steps = Some(steps);
        Ok(())
    }

    /// Drops the cached speed to zero and sends an explicit stop.
    ///
    /// The stop command is queued even when nothing is selected.
    pub fn emergency_stop(&mut self, throttle: ThrottleId, address: &str, queue: &mut OutboundQueue) {
        if self.set_speed(throttle, 0, false, queue).is_err() {
            debug!("throttle {throttle}: emergency stop with nothing selected");
        }
        queue.enqueue(OutboundCommand::EmergencyStop { throttle, address }.to_string());
    }
}
