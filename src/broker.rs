//! MQTT client construction for both processes.
//!
//! The reader uses the synchronous client: its publish loop is a plain
//! blocking loop and the connection is driven by a background thread. The
//! web process uses the async client so the subscription runs as a tokio
//! task beside the HTTP server. Reconnect/backoff is the client's own;
//! nothing here retries.

use std::time::Duration;

use rumqttc::{AsyncClient, Client, Connection, EventLoop, MqttOptions};

const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Queue capacity for requests waiting on the network event loop.
const REQUEST_CAP: usize = 10;

fn options(client_id: &str, host: &str, port: u16) -> MqttOptions {
    let mut opts = MqttOptions::new(client_id, host, port);
    opts.set_keep_alive(KEEP_ALIVE);
    opts
}

/// Synchronous client for the reader process. The returned [`Connection`]
/// must be iterated on a background thread to drive the network.
pub fn sync_client(client_id: &str, host: &str, port: u16) -> (Client, Connection) {
    Client::new(options(client_id, host, port), REQUEST_CAP)
}

/// Async client for the web process. The returned [`EventLoop`] must be
/// polled continuously; incoming publishes surface through it.
pub fn async_client(client_id: &str, host: &str, port: u16) -> (AsyncClient, EventLoop) {
    AsyncClient::new(options(client_id, host, port), REQUEST_CAP)
}
