//! Layout fast clock.
//!
//! The server announces a simulated time and a rate (`PFT<time><;><rate>`).
//! Between announcements the client advances the time itself, adding `rate`
//! simulated seconds once per elapsed real second.

use log::{debug, warn};

use crate::wire::{leading_float, leading_int, split_property};

const TICK_MS: u64 = 1000;

/// Simulated time value and playback rate.
#[derive(Clone, Debug)]
pub struct FastClock {
    value: f64,
    rate: f32,
    timer_ms: u64,
}

impl FastClock {
    /// Creates a frozen clock at time zero.
    pub fn new(now_ms: u64) -> Self {
        Self {
            value: 0.0,
            rate: 0.0,
            timer_ms: now_ms,
        }
    }

    /// Advances the clock if a real second has elapsed.
    ///
    /// Returns true when the simulated time moved. A frozen clock
    /// (rate 0) still consumes the second but reports no change.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.timer_ms) < TICK_MS {
            return false;
        }
        self.timer_ms = now_ms;
        if self.rate == 0.0 {
            return false;
        }
        self.value += f64::from(self.rate);
        true
    }

    /// Applies a `PFT` payload: `<time>` or `<time><;><rate>`.
    ///
    /// Each field overwrites its cached value only when it parses; a
    /// malformed field leaves the previous value in place. Returns the
    /// fields that were applied.
    pub fn set_from_wire(&mut self, payload: &str) -> (Option<f64>, Option<f32>) {
        let (time_text, rate_text) = split_property(payload);

        let time = leading_int(time_text).map(f64::from);
        match time {
            Some(time) => {
                debug!("fast time updated to {time} (was {})", self.value);
                self.value = time;
            }
            None => warn!("ignoring unparseable fast time '{time_text}'"),
        }

        let rate = rate_text.and_then(|text| {
            let rate = leading_float(text);
            if rate.is_none() {
                warn!("ignoring unparseable fast clock rate '{text}'");
            }
            rate
        });
        if let Some(rate) = rate {
            debug!("fast clock rate set to {rate}");
            self.rate = rate;
        }
        (time, rate)
    }

    /// Current simulated time.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Current rate; 0 means frozen.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Default for FastClock {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_clock_never_moves() {
        let mut clock = FastClock::new(0);
        clock.set_from_wire("1000");
        assert!(!clock.tick(1500));
        assert_eq!(clock.value(), 1000.0);
    }

    #[test]
    fn running_clock_advances_once_per_second() {
        let mut clock = FastClock::new(0);
        clock.set_from_wire("100<;>4.0");
        assert!(!clock.tick(999));
        assert!(clock.tick(1000));
        assert_eq!(clock.value(), 104.0);
        // Timer was reset at 1000
        assert!(!clock.tick(1500));
        assert!(clock.tick(2000));
        assert_eq!(clock.value(), 108.0);
    }

    #[test]
    fn wire_update_overwrites_instead_of_accumulating() {
        let mut clock = FastClock::new(0);
        clock.set_from_wire("500<;>1.0");
        clock.tick(1000);
        clock.set_from_wire("200");
        assert_eq!(clock.value(), 200.0);
        assert_eq!(clock.rate(), 1.0);
    }

    #[test]
    fn rate_only_changes_when_present() {
        let mut clock = FastClock::new(0);
        let (time, rate) = clock.set_from_wire("10<;>2.5");
        assert_eq!((time, rate), (Some(10.0), Some(2.5)));
        let (_, rate) = clock.set_from_wire("20");
        assert_eq!(rate, None);
        assert_eq!(clock.rate(), 2.5);
    }

    #[test]
    fn garbage_fields_keep_previous_values() {
        let mut clock = FastClock::new(0);
        clock.set_from_wire("1000<;>4.0");
        assert_eq!(clock.set_from_wire("abc<;>x"), (None, None));
        assert_eq!(clock.value(), 1000.0);
        assert_eq!(clock.rate(), 4.0);

        assert_eq!(clock.set_from_wire("abc<;>2.0"), (None, Some(2.0)));
        assert_eq!(clock.value(), 1000.0);
        assert_eq!(clock.rate(), 2.0);
    }
}
