//! lkvm-server library crate.
//!
//! Accepts JSON input events from a browser over WebSocket and replays them on
//! a target machine through a serial-attached USB-HID bridge.
//!
//! # Architecture
//!
//! ```text
//! Browser (JSON over WebSocket)
//!         ↕
//! [lkvm-server]
//!   ├── domain/           ServerConfig, InboundEvent schema, key name table
//!   ├── application/      InboundEvent → lkvm_core::Command
//!   └── infrastructure/
//!         └── ws_server/  Accept loop and per-session read loop
//!         ↓
//! lkvm_core::Dispatcher → SerialTransport → bridge device
//! ```
//!
//! # Layer rules
//!
//! - `domain` does no I/O apart from reading the config file on request.
//! - `application` is pure translation and depends on `domain` and `lkvm-core`.
//! - `infrastructure` owns sockets, tasks and the blocking hand-off to the
//!   serial transport.

/// Domain layer: configuration and message types.
pub mod domain;

/// Application layer: event translation.
pub mod application;

/// Infrastructure layer: WebSocket server.
pub mod infrastructure;
