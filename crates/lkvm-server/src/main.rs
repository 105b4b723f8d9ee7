//! lkvm-server: entry point.
//!
//! Opens the serial link to the HID bridge, then accepts WebSocket
//! connections from browsers and replays their input events on the target.
//!
//! # Usage
//!
//! ```text
//! lkvm-server [OPTIONS]
//!
//! Options:
//!   --config <FILE>          TOML config file
//!   --serial-port <PATH>     Serial device [default: /dev/ttyUSB0]
//!   --baud-rate <BAUD>       Serial baud rate [default: 9600]
//!   --screen-width <PX>      Target screen width [default: 1920]
//!   --screen-height <PX>     Target screen height [default: 1080]
//!   --mouse-mode <MODE>      absolute | relative [default: absolute]
//!   --bind <IP>              Listener address [default: 0.0.0.0]
//!   --port <PORT>            Listener port [default: 8080]
//!   --settle-ms <MS>         Post-write settle delay [default: 1]
//!   --log-level <FILTER>     Log filter when RUST_LOG is unset [default: info]
//! ```
//!
//! Every option can also be set with an `LKVM_*` environment variable (see
//! `--help`).  Precedence, highest first: command line, environment, config
//! file, built-in default.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use lkvm_core::{Dispatcher, PacketSink, SerialTransport};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lkvm_server::domain::{MouseMode, ServerConfig};
use lkvm_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Browser-driven keyboard and mouse for a machine behind a USB-HID bridge.
///
/// Options left unset fall back to the config file, then to the defaults.
#[derive(Debug, Parser)]
#[command(name = "lkvm-server", version)]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "LKVM_CONFIG")]
    config: Option<PathBuf>,

    /// Serial device the HID bridge is attached to [default: /dev/ttyUSB0].
    #[arg(long, env = "LKVM_SERIAL_PORT")]
    serial_port: Option<PathBuf>,

    /// Serial baud rate [default: 9600].
    #[arg(long, env = "LKVM_BAUD_RATE")]
    baud_rate: Option<u32>,

    /// Target screen width in pixels [default: 1920].
    #[arg(long, env = "LKVM_SCREEN_WIDTH")]
    screen_width: Option<i32>,

    /// Target screen height in pixels [default: 1080].
    #[arg(long, env = "LKVM_SCREEN_HEIGHT")]
    screen_height: Option<i32>,

    /// How `mousemove` coordinates are interpreted: absolute or relative.
    #[arg(long, env = "LKVM_MOUSE_MODE")]
    mouse_mode: Option<MouseMode>,

    /// Address to bind the WebSocket listener to [default: 0.0.0.0].
    #[arg(long, env = "LKVM_BIND")]
    bind: Option<IpAddr>,

    /// WebSocket listener port [default: 8080].
    #[arg(long, env = "LKVM_PORT")]
    port: Option<u16>,

    /// Milliseconds the serial port stays locked after each write [default: 1].
    #[arg(long, env = "LKVM_SETTLE_MS")]
    settle_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set [default: info].
    #[arg(long, env = "LKVM_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Builds the effective [`ServerConfig`]: the config file (or defaults)
    /// with every given option applied on top, then validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// the merged values fail validation.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(v) = self.serial_port {
            config.serial_port = v;
        }
        if let Some(v) = self.baud_rate {
            config.baud_rate = v;
        }
        if let Some(v) = self.screen_width {
            config.screen_width = v;
        }
        if let Some(v) = self.screen_height {
            config.screen_height = v;
        }
        if let Some(v) = self.mouse_mode {
            config.mouse_mode = v;
        }
        if let Some(v) = self.bind {
            config.bind = v;
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.settle_ms {
            config.settle_ms = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_server_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        "lkvm-server starting: serial={} @ {} baud, screen={}x{}, mouse={}",
        config.serial_port.display(),
        config.baud_rate,
        config.screen_width,
        config.screen_height,
        config.mouse_mode
    );

    // Fail fast: without the device there is nothing to serve.
    let transport = SerialTransport::open(&config.serial_port, config.baud_rate, config.settle())
        .with_context(|| {
            format!(
                "failed to open serial device {}",
                config.serial_port.display()
            )
        })?;
    let sink: Arc<dyn PacketSink> = Arc::new(transport);
    let dispatcher = Arc::new(Dispatcher::new(sink, config.screen()));

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C: {e}"),
        }
    });

    run_server(config, Arc::clone(&dispatcher), running).await?;

    release_on_shutdown(dispatcher).await;
    info!("lkvm-server stopped");
    Ok(())
}

/// Lets go of everything still held, on the blocking pool since the
/// serial writes sleep.
async fn release_on_shutdown(dispatcher: Arc<Dispatcher>) {
    match tokio::task::spawn_blocking(move || dispatcher.release_all()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("final release failed: {e}"),
        Err(e) => error!("final release task failed: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
