//! Heartbeat keep-alive scheduling.
//!
//! A server that wants keep-alive traffic announces a period with `*<secs>`.
//! The client then sends traffic every half period. [`HeartbeatMonitor`] only
//! decides *when* to fire; the caller turns a [`HeartbeatFire`] into commands.

use log::debug;

/// Minimum time after the most recent acquisition before a heartbeat also
/// re-broadcasts speed and direction, so the server has time to report any
/// state it already holds for the locomotive.
pub const RESYNC_SETTLE_MS: u64 = 5000;

/// What a firing heartbeat should send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeartbeatFire {
    /// Re-send forced speed and direction for every populated slot.
    pub resync: bool,
}

/// Tracks the server-mandated period and the half-period timer.
#[derive(Clone, Debug)]
pub struct HeartbeatMonitor {
    period_secs: u32,
    timer_ms: u64,
}

impl HeartbeatMonitor {
    /// Creates a disabled monitor.
    pub fn new(now_ms: u64) -> Self {
        Self {
            period_secs: 0,
            timer_ms: now_ms,
        }
    }

    /// Stores a period received from the server. Zero disables heartbeats.
    pub fn set_period(&mut self, secs: u32) {
        debug!("heartbeat period set to {secs}s");
        self.period_secs = secs;
    }

    /// Server-mandated period in seconds (0 = disabled).
    pub fn period_secs(&self) -> u32 {
        self.period_secs
    }

    /// True while the server requires keep-alive traffic.
    pub fn is_enabled(&self) -> bool {
        self.period_secs > 0
    }

    /// Fires once half the period has elapsed since the last firing.
    ///
    /// `last_acquired_ms` is the time of the most recent locomotive
    /// acquisition, if any; resync is requested only when it lies more than
    /// [`RESYNC_SETTLE_MS`] in the past. The timer resets on every firing.
    pub fn tick(&mut self, now_ms: u64, last_acquired_ms: Option<u64>) -> Option<HeartbeatFire> {
        if !self.is_enabled() {
            return None;
        }
        let half_period_ms = u64::from(self.period_secs) * 1000 / 2;
        if now_ms.saturating_sub(self.timer_ms) < half_period_ms {
            return None;
        }
        self.timer_ms = now_ms;
        let resync = last_acquired_ms
            .is_some_and(|at| now_ms.saturating_sub(at) > RESYNC_SETTLE_MS);
        debug!("heartbeat fired (resync: {resync})");
        Some(HeartbeatFire { resync })
    }
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new(0)
    }
}
