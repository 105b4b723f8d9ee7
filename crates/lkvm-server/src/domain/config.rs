//! Server configuration.
//!
//! [`ServerConfig`] holds every runtime setting.  It starts from
//! [`ServerConfig::default`] or from an optional TOML file, and `main.rs`
//! layers command-line and environment overrides on top before calling
//! [`ServerConfig::validate`].
//!
//! # File format
//!
//! Every key is optional; missing keys take their default.
//!
//! ```toml
//! serial_port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! screen_width = 1920
//! screen_height = 1080
//! mouse_mode = "absolute"
//! bind = "0.0.0.0"
//! port = 8080
//! settle_ms = 1
//! log_level = "info"
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use lkvm_core::transport::serial::DEFAULT_SETTLE;
use lkvm_core::ScreenSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error type for loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("screen dimensions must be positive, got {width}x{height}")]
    InvalidScreen { width: i32, height: i32 },

    #[error("baud rate must be non-zero")]
    InvalidBaudRate,
}

// ── Mouse mode ────────────────────────────────────────────────────────────────

/// How a browser `mousemove` event is replayed on the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseMode {
    /// `x`/`y` are pixel positions, scaled to the device's coordinate space.
    #[default]
    Absolute,
    /// `x`/`y` are pixel deltas.
    Relative,
}

impl fmt::Display for MouseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MouseMode::Absolute => "absolute",
            MouseMode::Relative => "relative",
        })
    }
}

impl FromStr for MouseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" | "abs" => Ok(MouseMode::Absolute),
            "relative" | "rel" => Ok(MouseMode::Relative),
            other => Err(format!(
                "unknown mouse mode '{other}' (expected 'absolute' or 'relative')"
            )),
        }
    }
}

// ── ServerConfig ──────────────────────────────────────────────────────────────

/// All runtime configuration for the server.
///
/// # Example
///
/// ```rust
/// use lkvm_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr().port(), 8080);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Serial device the HID bridge is attached to.
    #[serde(default = "default_serial_port")]
    pub serial_port: PathBuf,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Resolution of the controlled machine, used to scale absolute moves.
    #[serde(default = "default_screen_width")]
    pub screen_width: i32,

    #[serde(default = "default_screen_height")]
    pub screen_height: i32,

    #[serde(default)]
    pub mouse_mode: MouseMode,

    /// Address the WebSocket listener binds to.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Time the serial port stays locked after each write, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_serial_port() -> PathBuf {
    PathBuf::from("/dev/ttyUSB0")
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_screen_width() -> i32 {
    1920
}
fn default_screen_height() -> i32 {
    1080
}
fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_port() -> u16 {
    8080
}
fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE.as_millis() as u64
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            mouse_mode: MouseMode::default(),
            bind: default_bind(),
            port: default_port(),
            settle_ms: default_settle_ms(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Reads a TOML config file.  Unlike an implicit lookup, a path named
    /// by the user must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if the TOML is malformed or has unknown keys.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Checks the values that would only fail later, mid-session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScreen`] for a zero or negative
    /// dimension and [`ConfigError::InvalidBaudRate`] for a zero baud rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width <= 0 || self.screen_height <= 0 {
            return Err(ConfigError::InvalidScreen {
                width: self.screen_width,
                height: self.screen_height,
            });
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn screen(&self) -> ScreenSize {
        ScreenSize {
            width: self.screen_width,
            height: self.screen_height,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
