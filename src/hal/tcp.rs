//! TCP transport and wall clock for desktop hosts.
//!
//! WiThrottle servers (JMRI, DCC-EX, Digitrax LnWi) listen on TCP, usually
//! port 12090. [`TcpTransport`] wraps a non-blocking [`TcpStream`] so
//! [`WiThrottle::check`](crate::WiThrottle::check) can drain it without
//! stalling the poll loop. Output the socket cannot take yet is kept and
//! flushed on later `write` and `available` calls.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Instant;

use log::debug;

use crate::traits::{Clock, Transport};

/// Default WiThrottle server port.
pub const DEFAULT_PORT: u16 = 12090;

const READ_CHUNK: usize = 512;

/// Non-blocking TCP connection to a WiThrottle server.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    buffer: VecDeque<u8>,
    outgoing: VecDeque<u8>,
}

impl TcpTransport {
    /// Connects and switches the socket to non-blocking mode.
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        debug!("connected to {}", stream.peer_addr()?);
        Self::from_stream(stream)
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            buffer: VecDeque::new(),
            outgoing: VecDeque::new(),
        })
    }

    /// Bytes written by the client that the socket has not accepted yet.
    pub fn pending_writes(&self) -> usize {
        self.outgoing.len()
    }

    /// Sends as much buffered output as the socket accepts without blocking.
    /// Returns the number of bytes still pending.
    pub fn flush_pending(&mut self) -> io::Result<usize> {
        while !self.outgoing.is_empty() {
            let (front, _) = self.outgoing.as_slices();
            match self.stream.write(front) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outgoing.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(self.outgoing.len())
    }

    /// Pulls whatever the socket has ready into the read buffer.
    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::ConnectionAborted,
                        "server closed the connection",
                    ))
                }
                Ok(n) => self.buffer.extend(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Transport for TcpTransport {
    type Error = io::Error;

    fn available(&mut self) -> io::Result<usize> {
        self.flush_pending()?;
        if self.buffer.is_empty() {
            self.fill()?;
        }
        Ok(self.buffer.len())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.buffer.is_empty() {
            self.fill()?;
        }
        Ok(self.buffer.pop_front())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.outgoing.extend(bytes);
        let pending = self.flush_pending()?;
        if pending > 0 {
            debug!("socket busy, {pending} bytes held for the next poll");
        }
        Ok(())
    }
}

/// Milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Starts counting from now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
