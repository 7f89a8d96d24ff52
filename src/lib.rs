//! sonda — relays UART probe readings to MQTT, persists them, and serves a
//! live dashboard.
//!
//! Two binaries share this library:
//! - `sonda-reader`: reads lines from a serial-like source and publishes one
//!   timestamped record per line to the `sonda/uart` channel.
//! - `sonda-web`: subscribes to the channel, stores each reading in SQLite,
//!   and serves the dashboard with live updates pushed over SSE.

pub mod broker;
pub mod db;
pub mod ingest;
pub mod reader;
pub mod web;
pub mod wire;
