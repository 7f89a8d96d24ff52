//! Ingestor — consumes published records, persists them, and notifies
//! connected dashboard viewers.
//!
//! One background task owns the broker subscription. Each received record is
//! handled as a single synchronous step: parse, insert, broadcast — in that
//! order, so a viewer is never notified of a reading that is not yet
//! queryable. Malformed records are logged and dropped; there is no retry
//! and no dead-letter path.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::db::{models::Reading, Database};
use crate::wire::{self, CHANNEL};

/// Fan-out capacity per viewer; a viewer that lags further than this loses
/// the oldest events (delivery is at-most-once anyway).
const LIVE_CHANNEL_CAP: usize = 64;

/// Payload of the `new_data` event pushed to dashboard viewers. Carries the
/// literal substrings from the wire record, not re-rendered values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveUpdate {
    pub timestamp: String,
    pub value: String,
}

/// Create the live-update fan-out. Viewers subscribe; the ingest loop sends.
pub fn live_channel() -> broadcast::Sender<LiveUpdate> {
    broadcast::channel(LIVE_CHANNEL_CAP).0
}

/// Poll the broker event loop forever, handling each received record.
///
/// The subscription is (re)established on every `ConnAck` so it survives the
/// client's own reconnects. Event-loop errors are logged and polling
/// continues; only storage failures abort the loop.
pub async fn run(
    client: AsyncClient,
    mut eventloop: EventLoop,
    db: Database,
    live: broadcast::Sender<LiveUpdate>,
) -> Result<()> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to broker; subscribing to {CHANNEL}");
                client
                    .subscribe(CHANNEL, QoS::AtMostOnce)
                    .await
                    .context("failed to subscribe to channel")?;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_record(&db, &live, &publish.payload).await?;
            }
            Ok(_) => {}
            Err(err) => {
                error!("MQTT event loop error: {err}; waiting for reconnect");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Handle one received payload: parse, insert, then broadcast.
///
/// A malformed payload is logged and dropped without touching storage or the
/// fan-out; only a storage failure is returned as an error.
pub async fn handle_record(
    db: &Database,
    live: &broadcast::Sender<LiveUpdate>,
    payload: &[u8],
) -> Result<()> {
    let record = match wire::parse_record(payload) {
        Ok(record) => record,
        Err(err) => {
            warn!(
                "Invalid message received: {:?}, error: {err}",
                String::from_utf8_lossy(payload)
            );
            return Ok(());
        }
    };

    db.insert_reading(&Reading::new(record.timestamp, record.value))
        .await
        .context("failed to persist reading")?;

    // Send fails only when no viewer is connected; that is not an error.
    let _ = live.send(LiveUpdate {
        timestamp: record.timestamp_raw,
        value: record.value_raw,
    });

    Ok(())
}
