//! Inbound line framing.
//!
//! Servers terminate each line with `\n` or `\r` and frequently send a second,
//! empty terminator straight after. [`LineFramer`] turns the byte stream into
//! complete lines and silently absorbs those empty terminators.
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::framer::LineFramer;
//!
//! let mut framer: LineFramer<64> = LineFramer::new();
//! let mut lines = Vec::new();
//! for &b in b"VN2.0\n\nPPA1\r\n" {
//!     if let Some(line) = framer.push(b) {
//!         lines.push(line.to_string());
//!     }
//! }
//! assert_eq!(lines, ["VN2.0", "PPA1"]);
//! ```

use alloc::borrow::Cow;
use alloc::string::String;

use heapless::Vec as HVec;
use log::warn;

/// Largest line the client accepts before discarding the buffer.
pub const MAX_LINE_LENGTH: usize = 32_767;

/// Byte-at-a-time line accumulator with a fixed capacity of `N` bytes.
///
/// A line that reaches `N` bytes without a terminator is dropped and
/// accumulation restarts; the next terminator then resynchronizes.
pub struct LineFramer<const N: usize> {
    buffer: HVec<u8, N>,
    emitted: bool,
    overlong: usize,
}

impl<const N: usize> LineFramer<N> {
    /// Creates an empty framer.
    pub const fn new() -> Self {
        Self {
            buffer: HVec::new(),
            emitted: false,
            overlong: 0,
        }
    }

    /// Feeds one byte. Returns the completed line (terminator stripped) when
    /// `byte` ends a non-empty line.
    ///
    /// The returned line borrows the buffer until the next call. A line that
    /// is not valid UTF-8 is logged and decoded lossily, so it is still
    /// delivered.
    pub fn push(&mut self, byte: u8) -> Option<Cow<'_, str>> {
        if self.emitted {
            self.buffer.clear();
            self.emitted = false;
        }

        if byte == b'\n' || byte == b'\r' {
            if self.buffer.is_empty() {
                return None;
            }
            self.emitted = true;
            let line = String::from_utf8_lossy(&self.buffer);
            if let Cow::Owned(_) = line {
                warn!("line is not valid UTF-8, decoding lossily");
            }
            return Some(line);
        }

        if self.buffer.push(byte).is_err() || self.buffer.is_full() {
            warn!("line too long (>= {N} bytes), discarding buffer");
            self.overlong += 1;
            self.buffer.clear();
        }
        None
    }

    /// Discards any partially received line.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.emitted = false;
    }

    /// Bytes accumulated for the line in progress.
    pub fn pending(&self) -> usize {
        if self.emitted {
            0
        } else {
            self.buffer.len()
        }
    }

    /// Number of overlong lines discarded since creation.
    pub fn overlong_count(&self) -> usize {
        self.overlong
    }
}

impl<const N: usize> Default for LineFramer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn feed<const N: usize>(framer: &mut LineFramer<N>, bytes: &[u8]) -> Vec<String> {
        bytes
            .iter()
            .filter_map(|&b| framer.push(b).map(|l| l.to_string()))
            .collect()
    }

    #[test]
    fn doubled_newline_yields_one_line() {
        let mut framer: LineFramer<64> = LineFramer::new();
        assert_eq!(feed(&mut framer, b"V126\n\n"), ["V126"]);
    }

    #[test]
    fn carriage_return_terminates() {
        let mut framer: LineFramer<64> = LineFramer::new();
        assert_eq!(feed(&mut framer, b"PPA1\r\nPPA0\r"), ["PPA1", "PPA0"]);
    }

    #[test]
    fn partial_line_is_held() {
        let mut framer: LineFramer<64> = LineFramer::new();
        assert!(feed(&mut framer, b"MTA").is_empty());
        assert_eq!(framer.pending(), 3);
        assert_eq!(feed(&mut framer, b"*<;>V5\n"), ["MTA*<;>V5"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn overlong_line_is_discarded_and_resyncs() {
        let mut framer: LineFramer<8> = LineFramer::new();
        let lines = feed(&mut framer, b"0123456789\nok\n");
        // The tail after the discard point still forms a (garbage) line.
        assert_eq!(framer.overlong_count(), 1);
        assert_eq!(lines.last().map(String::as_str), Some("ok"));
        assert!(lines.iter().all(|l| l.len() < 8));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut framer: LineFramer<16> = LineFramer::new();
        assert_eq!(feed(&mut framer, b"HtZ\xfcrich\n"), ["HtZ\u{fffd}rich"]);
        assert_eq!(feed(&mut framer, b"HTJMRI\n"), ["HTJMRI"]);
    }

    #[test]
    fn clear_drops_partial_line() {
        let mut framer: LineFramer<16> = LineFramer::new();
        feed(&mut framer, b"PFT12");
        framer.clear();
        assert_eq!(feed(&mut framer, b"\nVN2\n"), ["VN2"]);
    }

    proptest! {
        #[test]
        fn emitted_lines_never_contain_terminators(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut framer: LineFramer<32> = LineFramer::new();
            for &b in &bytes {
                if let Some(line) = framer.push(b) {
                    prop_assert!(!line.is_empty());
                    prop_assert!(!line.contains('\n') && !line.contains('\r'));
                    prop_assert!(line.chars().count() < 32);
                }
            }
        }

        #[test]
        fn terminator_runs_collapse(line in "[A-Za-z0-9*<;>]{1,20}", extra in 0usize..4) {
            let mut framer: LineFramer<64> = LineFramer::new();
            let mut input = line.clone().into_bytes();
            input.push(b'\n');
            input.extend(core::iter::repeat(b'\n').take(extra));
            let lines = feed(&mut framer, &input);
            prop_assert_eq!(lines, [line]);
        }
    }
}
