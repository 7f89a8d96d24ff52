//! Reading data model.
//!
//! One timestamped numeric measurement relayed from the probe. Readings are
//! append-only: once stored they are never updated or deleted.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Assigned by SQLite on insert; `None` before the row exists.
    pub id: Option<i64>,
    /// Capture time, second resolution, local wall clock.
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            id: None,
            timestamp,
            value,
        }
    }
}
