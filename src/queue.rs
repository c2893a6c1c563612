//! Outbound command queue with minimum inter-command pacing.
//!
//! Command stations can be overwhelmed by bursts, so commands are never
//! written straight to the transport. They are queued and released one per
//! [`OutboundQueue::tick`], and only once `min_delay_ms` has elapsed since the
//! previous release.
//!
//! ```rust
//! use rs_withrottle::queue::OutboundQueue;
//!
//! let mut queue = OutboundQueue::new(50, 0);
//! queue.enqueue("NCab");
//! queue.enqueue("*+");
//!
//! assert_eq!(queue.tick(50).as_deref(), Some("NCab"));
//! assert_eq!(queue.tick(60), None); // paced
//! assert_eq!(queue.tick(100).as_deref(), Some("*+"));
//! ```

use alloc::collections::VecDeque;
use alloc::string::String;

use log::trace;

/// FIFO of pending command lines plus pacing state.
#[derive(Debug)]
pub struct OutboundQueue {
    pending: VecDeque<String>,
    last_sent_ms: u64,
    min_delay_ms: u64,
}

impl OutboundQueue {
    /// Creates an empty queue. `now_ms` seeds the pacing timer, so the first
    /// command waits one full delay after connect.
    pub fn new(min_delay_ms: u64, now_ms: u64) -> Self {
        Self {
            pending: VecDeque::new(),
            last_sent_ms: now_ms,
            min_delay_ms,
        }
    }

    /// Appends a command. Empty commands are ignored.
    pub fn enqueue(&mut self, cmd: impl Into<String>) {
        let cmd = cmd.into();
        if cmd.is_empty() {
            return;
        }
        trace!("queued: {cmd} ({} pending)", self.pending.len() + 1);
        self.pending.push_back(cmd);
    }

    /// Releases at most one command if the pacing interval has elapsed.
    ///
    /// Releasing updates the pacing timer; an idle tick does not.
    #[must_use]
    pub fn tick(&mut self, now_ms: u64) -> Option<String> {
        if self.pending.is_empty() || !self.is_ready(now_ms) {
            return None;
        }
        let cmd = self.pending.pop_front()?;
        self.last_sent_ms = now_ms;
        if !self.pending.is_empty() {
            trace!("deferring {} command(s)", self.pending.len());
        }
        Some(cmd)
    }

    /// True once `min_delay_ms` has passed since the last release.
    pub fn is_ready(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_sent_ms) >= self.min_delay_ms
    }

    /// Drops every pending command.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Pending commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// Returns the number of pending commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Configured minimum delay between releases.
    pub fn min_delay_ms(&self) -> u64 {
        self.min_delay_ms
    }

    /// Timestamp of the last release (or of construction).
    pub fn last_sent_ms(&self) -> u64 {
        self.last_sent_ms
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new(50, 0)
    }
}
