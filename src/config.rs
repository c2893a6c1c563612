//! Client configuration.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_withrottle::config::{Config, ProtocolConfig, ServerConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.protocol.min_command_delay_ms, 50);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_server(ServerConfig::default().with_host("192.168.1.20"))
//!     .with_protocol(ProtocolConfig::default().with_device_name("Cab 1"));
//! ```

use heapless::String as HString;

/// Maximum length for config strings (hostnames, device names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating at a character boundary if
/// too long
pub fn short_string(s: &str) -> ShortString {
    let mut end = s.len().min(MAX_SHORT_STRING);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut hs = ShortString::new();
    let _ = hs.push_str(&s[..end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete client configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Where to connect
    pub server: ServerConfig,
    /// Protocol engine settings
    pub protocol: ProtocolConfig,
}

impl Config {
    /// Set server configuration
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set protocol configuration
    pub fn with_protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.protocol = protocol;
        self
    }
}

/// Parse a [`Config`] from JSON without allocating.
///
/// Missing fields take their defaults.
///
/// ```rust
/// use rs_withrottle::config::from_json;
///
/// let config = from_json(br#"{"protocol":{"server_mode":true}}"#).unwrap();
/// assert!(config.protocol.server_mode);
/// assert_eq!(config.server.port, 12090);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn from_json(json: &[u8]) -> Result<Config, serde_json_core::de::Error> {
    serde_json_core::from_slice(json).map(|(config, _)| config)
}

// ============================================================================
// Server Config
// ============================================================================

/// WiThrottle server address
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServerConfig {
    /// Server hostname or IP
    pub host: ShortString,
    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: short_string("localhost"),
            port: 12090,
        }
    }
}

impl ServerConfig {
    /// Set the server host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

// ============================================================================
// Protocol Config
// ============================================================================

/// Protocol engine configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProtocolConfig {
    /// Minimum gap between two outbound commands in milliseconds
    pub min_command_delay_ms: u32,
    /// Write `\r\n` before every command (some WiFi bridges need it)
    pub leading_crlf: bool,
    /// Follow every command with an extra blank line, as servers do
    pub server_mode: bool,
    /// Sent as `N<name>` on connect when non-empty
    pub device_name: ShortString,
    /// Sent as `HU<id>` on connect when non-empty
    pub device_id: ShortString,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            min_command_delay_ms: 50,
            leading_crlf: false,
            server_mode: false,
            device_name: ShortString::new(),
            device_id: ShortString::new(),
        }
    }
}

impl ProtocolConfig {
    /// Set the minimum inter-command delay
    pub fn with_min_command_delay_ms(mut self, ms: u32) -> Self {
        self.min_command_delay_ms = ms;
        self
    }

    /// Set whether commands need a leading CR/LF
    pub fn with_leading_crlf(mut self, needed: bool) -> Self {
        self.leading_crlf = needed;
        self
    }

    /// Set server framing
    pub fn with_server_mode(mut self, server: bool) -> Self {
        self.server_mode = server;
        self
    }

    /// Set the device name announced on connect
    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = short_string(name);
        self
    }

    /// Set the device id announced on connect
    pub fn with_device_id(mut self, id: &str) -> Self {
        self.device_id = short_string(id);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
