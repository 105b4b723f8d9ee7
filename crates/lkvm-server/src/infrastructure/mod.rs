//! Infrastructure layer for lkvm-server.
//!
//! Owns the TCP listener, the WebSocket handshake, per-session tasks and the
//! hand-off of each command to the blocking pool where the serial write runs.
//! Translation rules live in the application layer; config parsing in
//! `main.rs` and the domain layer.

pub mod ws_server;

pub use ws_server::{run_server, serve};
