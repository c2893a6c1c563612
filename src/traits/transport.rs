//! Byte-stream transport and time source.
//!
//! The protocol engine performs no connection management. It only needs a
//! duplex byte stream that can be polled without blocking, and a monotonic
//! millisecond clock for hosts that do not track time themselves.
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Transport`] | Non-blocking reads and fire-and-forget writes |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::traits::Transport;
//! use rs_withrottle::hal::MockTransport;
//!
//! let mut transport = MockTransport::new();
//! transport.feed("VN2.0\n");
//!
//! assert_eq!(transport.available().unwrap(), 6);
//! assert_eq!(transport.read_byte().unwrap(), Some(b'V'));
//!
//! transport.write(b"NCab\n").unwrap();
//! assert_eq!(transport.sent_lines(), ["NCab"]);
//! ```

/// Duplex byte stream the client is attached to.
///
/// Implementations must never block. `read_byte` returning `Ok(None)` means
/// nothing is available right now, not end of stream.
pub trait Transport {
    /// Error type for transport failures.
    type Error;

    /// Number of bytes that can be read without blocking.
    fn available(&mut self) -> Result<usize, Self::Error>;

    /// Reads one byte if one is available.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Writes all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn available(&mut self) -> Result<usize, Self::Error> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        (**self).read_byte()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }
}

/// Abstraction for time sources.
///
/// ```rust
/// use rs_withrottle::traits::Clock;
/// use rs_withrottle::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}
