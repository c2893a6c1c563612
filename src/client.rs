//! The WiThrottle protocol engine.
//!
//! [`WiThrottle`] ties together the framer, dispatcher, throttle table,
//! outbound queue, heartbeat, and fast clock. It is driven entirely by the
//! host calling [`check`](WiThrottle::check) in its main loop with the current
//! time; nothing in here blocks or reads a clock on its own.
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::{Direction, ProtocolConfig, ThrottleId, WiThrottle};
//! use rs_withrottle::hal::MockTransport;
//!
//! let config = ProtocolConfig::default().with_min_command_delay_ms(0);
//! let mut wit = WiThrottle::new(config);
//! wit.connect(MockTransport::new(), 0);
//!
//! let t = ThrottleId::DEFAULT;
//! wit.add_locomotive(t, "L3").unwrap();
//! wit.set_direction(t, "*", Direction::Reverse, false).unwrap();
//! wit.set_speed(t, 20, false).unwrap();
//!
//! // One command leaves per check
//! for now in 0..3 {
//!     wit.check(now, &mut ()).unwrap();
//! }
//! let sent = wit.transport().unwrap().sent_lines();
//! assert_eq!(sent, ["MT+L3<;>L3", "MTA*<;>R0", "MTA*<;>V20"]);
//! ```

use alloc::boxed::Box;
use alloc::string::{String, ToString};

use log::{debug, trace, warn};

use crate::config::ProtocolConfig;
use crate::dispatch::{self, Session};
use crate::error::CommandError;
use crate::framer::{LineFramer, MAX_LINE_LENGTH};
use crate::queue::OutboundQueue;
use crate::traits::{Delegate, Transport};
use crate::types::{
    Direction, SpeedSteps, ThrottleId, TrackPower, TurnoutAction, MAX_THROTTLES,
};
use crate::wire::{OutboundCommand, ALL_LOCOMOTIVES};

/// WiThrottle client bound to a [`Transport`].
///
/// Created disconnected; [`connect`](Self::connect) attaches a transport and
/// resets all protocol state. The mutation API queues commands whether or not
/// a transport is attached, but `connect` discards anything queued before it.
pub struct WiThrottle<T: Transport> {
    config: ProtocolConfig,
    transport: Option<T>,
    framer: Box<LineFramer<MAX_LINE_LENGTH>>,
    queue: OutboundQueue,
    session: Session,
    device_name: String,
    now_ms: u64,
}

impl<T: Transport> WiThrottle<T> {
    /// Creates a disconnected client.
    pub fn new(config: ProtocolConfig) -> Self {
        let min_delay = u64::from(config.min_command_delay_ms);
        Self {
            device_name: config.device_name.as_str().into(),
            config,
            transport: None,
            framer: Box::new(LineFramer::new()),
            queue: OutboundQueue::new(min_delay, 0),
            session: Session::new(0),
            now_ms: 0,
        }
    }

    /// Attaches a transport and resets all protocol state.
    ///
    /// A configured device name and id are queued straight away.
    pub fn connect(&mut self, transport: T, now_ms: u64) {
        if self.transport.is_some() {
            debug!("replacing existing transport");
        }
        self.reset(now_ms);
        self.transport = Some(transport);
        debug!(
            "connected; minimum command delay {}ms",
            self.config.min_command_delay_ms
        );

        let name = self.config.device_name.clone();
        if !name.is_empty() {
            self.set_device_name(&name);
        }
        let id = self.config.device_id.clone();
        if !id.is_empty() {
            self.set_device_id(&id);
        }
    }

    /// Sends `Q` (best effort, bypassing the queue), resets all state, and
    /// returns the transport.
    pub fn disconnect(&mut self) -> Option<T> {
        let mut transport = self.transport.take()?;
        let quit = OutboundCommand::Quit.to_string();
        if write_command(&mut transport, &self.config, &quit).is_err() {
            warn!("could not send quit while disconnecting");
        }
        self.reset(self.now_ms);
        debug!("disconnected");
        Some(transport)
    }

    fn reset(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.session = Session::new(now_ms);
        self.framer.clear();
        self.queue = OutboundQueue::new(u64::from(self.config.min_command_delay_ms), now_ms);
    }

    /// True while a transport is attached.
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// The attached transport.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// The attached transport, mutably.
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Active configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    // ========================================================================
    // Polling
    // ========================================================================

    /// Runs one poll cycle.
    ///
    /// In order: advances the fast clock, runs heartbeat housekeeping, drains
    /// and dispatches every available inbound byte, then releases at most one
    /// queued command. Returns whether any visible state changed. Only
    /// transport failures are errors; while disconnected this is a no-op.
    pub fn check<D: Delegate + ?Sized>(
        &mut self,
        now_ms: u64,
        delegate: &mut D,
    ) -> Result<bool, T::Error> {
        self.session.reset_change_flags();
        if self.transport.is_none() {
            return Ok(false);
        }
        self.now_ms = now_ms;

        let mut changed = false;
        if self.session.fast_clock.tick(now_ms) {
            self.session.clock_changed = true;
            changed = true;
        }
        changed |= self.check_heartbeat(now_ms);

        let Self {
            config,
            transport,
            framer,
            queue,
            session,
            ..
        } = self;
        let Some(transport) = transport.as_mut() else {
            return Ok(changed);
        };

        while transport.available()? > 0 {
            let Some(byte) = transport.read_byte()? else {
                break;
            };
            if let Some(line) = framer.push(byte) {
                changed |= dispatch::process_line(session, &line, now_ms, delegate);
            }
        }

        if let Some(cmd) = queue.tick(now_ms) {
            write_command(transport, config, &cmd)?;
            trace!("==> {cmd} ({now_ms})");
        }
        Ok(changed)
    }

    fn check_heartbeat(&mut self, now_ms: u64) -> bool {
        let last_acquired = self.session.throttles.last_acquired_ms();
        let Some(fire) = self.session.heartbeat.tick(now_ms, last_acquired) else {
            return false;
        };

        self.queue.enqueue(OutboundCommand::KeepAlive.to_string());
        if !self.device_name.is_empty() {
            self.queue
                .enqueue(OutboundCommand::DeviceName(&self.device_name).to_string());
        }

        if fire.resync {
            for slot in 0..MAX_THROTTLES {
                let id = ThrottleId::from_slot(slot);
                let throttles = &mut self.session.throttles;
                if throttles.number_of_locomotives(id) == 0 {
                    continue;
                }
                let (speed, direction) = (throttles.speed(id), throttles.direction(id));
                let resent = throttles
                    .set_speed(id, i32::from(speed), true, &mut self.queue)
                    .and_then(|()| {
                        throttles.set_direction(id, ALL_LOCOMOTIVES, direction, true, &mut self.queue)
                    });
                if let Err(e) = resent {
                    warn!("heartbeat resync of throttle {id} failed: {e}");
                }
            }
        }
        true
    }

    // ========================================================================
    // Session commands
    // ========================================================================

    /// Announces the device name (`N<name>`). The name is repeated with every
    /// heartbeat.
    pub fn set_device_name(&mut self, name: &str) {
        self.device_name = name.into();
        self.queue
            .enqueue(OutboundCommand::DeviceName(name).to_string());
    }

    /// Announces a unique device id (`HU<id>`).
    pub fn set_device_id(&mut self, id: &str) {
        self.queue.enqueue(OutboundCommand::DeviceId(id).to_string());
    }

    /// Asks the server to enforce (`*+`) or drop (`*-`) heartbeats.
    pub fn require_heartbeat(&mut self, needed: bool) {
        self.queue
            .enqueue(OutboundCommand::RequireHeartbeat(needed).to_string());
    }

    /// Requests a track power state.
    pub fn set_track_power(&mut self, state: TrackPower) {
        self.queue
            .enqueue(OutboundCommand::TrackPower(state).to_string());
    }

    /// Requests a turnout action.
    pub fn set_turnout(&mut self, system_name: &str, action: TurnoutAction) {
        self.queue.enqueue(
            OutboundCommand::Turnout {
                name: system_name,
                action,
            }
            .to_string(),
        );
    }

    /// Sets a route.
    pub fn set_route(&mut self, system_name: &str) {
        self.queue
            .enqueue(OutboundCommand::Route(system_name).to_string());
    }

    // ========================================================================
    // Throttle commands
    // ========================================================================

    /// Acquires a locomotive (`S<n>` or `L<n>`) on a throttle.
    pub fn add_locomotive(&mut self, throttle: ThrottleId, address: &str) -> Result<(), CommandError> {
        self.session
            .throttles
            .add_locomotive(throttle, address, self.now_ms, &mut self.queue)
    }

    /// Releases and re-acquires a locomotive held elsewhere.
    pub fn steal_locomotive(&mut self, throttle: ThrottleId, address: &str) -> Result<(), CommandError> {
        self.session
            .throttles
            .steal_locomotive(throttle, address, self.now_ms, &mut self.queue)
    }

    /// Releases one locomotive, or all of them with `*`.
    pub fn release_locomotive(&mut self, throttle: ThrottleId, address: &str) {
        self.session
            .throttles
            .release_locomotive(throttle, address, &mut self.queue)
    }

    /// Sets speed (0..=126). Unchanged values are only sent when `force` is set.
    pub fn set_speed(&mut self, throttle: ThrottleId, speed: i32, force: bool) -> Result<(), CommandError> {
        self.session
            .throttles
            .set_speed(throttle, speed, force, &mut self.queue)
    }

    /// Sets direction for `*` or a single locomotive in the consist.
    pub fn set_direction(
        &mut self,
        throttle: ThrottleId,
        address: &str,
        direction: Direction,
        force: bool,
    ) -> Result<(), CommandError> {
        self.session
            .throttles
            .set_direction(throttle, address, direction, force, &mut self.queue)
    }

    /// Presses or releases a function on `address`, or on the lead with `None`.
    pub fn set_function(
        &mut self,
        throttle: ThrottleId,
        address: Option<&str>,
        number: u8,
        pressed: bool,
    ) -> Result<(), CommandError> {
        self.session
            .throttles
            .set_function(throttle, address, number, pressed, &mut self.queue)
    }

    /// Requests a speed-step mode.
    pub fn set_speed_steps(&mut self, throttle: ThrottleId, steps: SpeedSteps) -> Result<(), CommandError> {
        self.session
            .throttles
            .set_speed_steps(throttle, steps, &mut self.queue)
    }

    /// Zeroes speed and sends an emergency stop for `address` (or `*`).
    pub fn emergency_stop(&mut self, throttle: ThrottleId, address: &str) {
        self.session
            .throttles
            .emergency_stop(throttle, address, &mut self.queue)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// True when the throttle has at least one locomotive.
    pub fn is_selected(&self, throttle: ThrottleId) -> bool {
        self.session.throttles.is_selected(throttle)
    }

    /// Lead locomotive of the consist.
    pub fn lead_locomotive(&self, throttle: ThrottleId) -> Option<&str> {
        self.session.throttles.lead_locomotive(throttle)
    }

    /// Locomotive at `position` in the consist.
    pub fn locomotive_at(&self, throttle: ThrottleId, position: usize) -> Option<&str> {
        self.session.throttles.locomotive_at(throttle, position)
    }

    /// Number of locomotives on the throttle.
    pub fn number_of_locomotives(&self, throttle: ThrottleId) -> usize {
        self.session.throttles.number_of_locomotives(throttle)
    }

    /// Cached speed.
    pub fn speed(&self, throttle: ThrottleId) -> u8 {
        self.session.throttles.speed(throttle)
    }

    /// Cached aggregate direction.
    pub fn direction(&self, throttle: ThrottleId) -> Direction {
        self.session.throttles.direction(throttle)
    }

    /// Facing of one locomotive in the consist.
    pub fn direction_of(&self, throttle: ThrottleId, address: &str) -> Direction {
        self.session.throttles.direction_of(throttle, address)
    }

    /// Cached speed-step mode.
    pub fn speed_steps(&self, throttle: ThrottleId) -> Option<SpeedSteps> {
        self.session.throttles.speed_steps(throttle)
    }

    /// Current fast-clock time.
    pub fn current_fast_time(&self) -> f64 {
        self.session.fast_clock.value()
    }

    /// Current fast-clock rate (0 when frozen).
    pub fn fast_time_rate(&self) -> f32 {
        self.session.fast_clock.rate()
    }

    /// The fast clock moved during the last `check`.
    pub fn clock_changed(&self) -> bool {
        self.session.clock_changed
    }

    /// The server announced a heartbeat period during the last `check`.
    pub fn heartbeat_changed(&self) -> bool {
        self.session.heartbeat_changed
    }

    /// Heartbeat period in seconds; 0 when not required.
    pub fn heartbeat_period(&self) -> u32 {
        self.session.heartbeat.period_secs()
    }

    /// Seconds-resolution timestamp of the last line received.
    pub fn last_server_response_secs(&self) -> u64 {
        self.session.last_server_response_secs
    }

    /// Name sent with `N` and repeated on heartbeats.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Commands waiting for their pacing slot, oldest first.
    pub fn queued_commands(&self) -> impl Iterator<Item = &str> {
        self.queue.iter()
    }
}

/// Writes one command with the configured framing.
fn write_command<T: Transport>(
    transport: &mut T,
    config: &ProtocolConfig,
    cmd: &str,
) -> Result<(), T::Error> {
    if config.leading_crlf {
        transport.write(b"\r\n")?;
    }
    transport.write(cmd.as_bytes())?;
    transport.write(b"\n")?;
    if config.server_mode {
        transport.write(b"\n")?;
    }
    Ok(())
}
