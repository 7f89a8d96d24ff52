use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::params;

use crate::db::{
    helpers::{format_timestamp, parse_timestamp},
    models::Reading,
    Database,
};

impl Database {
    /// Insert one reading as a single transaction.
    pub async fn insert_reading(&self, reading: &Reading) -> Result<()> {
        let record = reading.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO readings (timestamp, value) VALUES (?1, ?2)",
                params![format_timestamp(record.timestamp), record.value],
            )
            .with_context(|| "failed to insert reading")?;
            Ok(())
        })
        .await
    }

    /// All readings with `start <= timestamp < end`, most recent first.
    pub async fn query_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reading>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, value
                 FROM readings
                 WHERE timestamp >= ?1 AND timestamp < ?2
                 ORDER BY timestamp DESC",
            )?;

            let mut rows = stmt.query(params![format_timestamp(start), format_timestamp(end)])?;
            collect_readings(&mut rows)
        })
        .await
    }

    /// The most recently captured readings, newest first, capped at `limit`.
    pub async fn recent_readings(&self, limit: u32) -> Result<Vec<Reading>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, value
                 FROM readings
                 ORDER BY timestamp DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            collect_readings(&mut rows)
        })
        .await
    }
}

fn collect_readings(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<Reading>> {
    let mut readings = Vec::new();
    while let Some(row) = rows.next()? {
        readings.push(Reading {
            id: Some(row.get::<_, i64>(0)?),
            timestamp: parse_timestamp(&row.get::<_, String>(1)?, "timestamp")?,
            value: row.get(2)?,
        });
    }
    Ok(readings)
}
