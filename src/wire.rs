//! Wire record format shared by the reader and the ingestor.
//!
//! A record is UTF-8 text of the form `"<timestamp>: <value>"` where the
//! timestamp is `%Y-%m-%d %H:%M:%S` and the value is a decimal number,
//! published on the `sonda/uart` channel.

use chrono::NaiveDateTime;
use thiserror::Error;

/// MQTT channel the reader publishes to and the ingestor subscribes to.
pub const CHANNEL: &str = "sonda/uart";

/// Timestamp format used on the wire and in storage. Second resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between the timestamp part and the value part.
const SEPARATOR: &str = ": ";

/// Reasons a received record is rejected.
#[derive(Debug, Error)]
pub enum WireError {
    /// Payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The `": "` separator did not split the record into exactly two parts.
    #[error("expected exactly two ': '-separated parts, found {0}")]
    Split(usize),

    /// Timestamp part did not match `%Y-%m-%d %H:%M:%S`.
    #[error("invalid timestamp '{raw}': {source}")]
    Timestamp {
        raw: String,
        source: chrono::ParseError,
    },

    /// Value part is not a number.
    #[error("invalid value '{raw}': {source}")]
    Value {
        raw: String,
        source: std::num::ParseFloatError,
    },
}

/// A successfully parsed wire record.
///
/// `timestamp_raw` and `value_raw` keep the literal substrings so the
/// live-update event can carry them through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRecord {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub timestamp_raw: String,
    pub value_raw: String,
}

/// Format one outgoing record from a capture timestamp and a raw line.
pub fn format_record(timestamp: NaiveDateTime, line: &str) -> String {
    format!("{}{}{}", timestamp.format(TIMESTAMP_FORMAT), SEPARATOR, line)
}

/// Parse an incoming payload into a [`WireRecord`].
///
/// The split must yield exactly two parts; a value containing another
/// `": "` makes the whole record malformed rather than being re-joined.
pub fn parse_record(payload: &[u8]) -> Result<WireRecord, WireError> {
    let text = std::str::from_utf8(payload)?;

    let parts: Vec<&str> = text.split(SEPARATOR).collect();
    if parts.len() != 2 {
        return Err(WireError::Split(parts.len()));
    }
    let (timestamp_raw, value_raw) = (parts[0], parts[1]);

    let timestamp = NaiveDateTime::parse_from_str(timestamp_raw, TIMESTAMP_FORMAT).map_err(
        |source| WireError::Timestamp {
            raw: timestamp_raw.to_string(),
            source,
        },
    )?;

    let value: f64 = value_raw.parse().map_err(|source| WireError::Value {
        raw: value_raw.to_string(),
        source,
    })?;

    Ok(WireRecord {
        timestamp,
        value,
        timestamp_raw: timestamp_raw.to_string(),
        value_raw: value_raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_record() {
        let record = parse_record(b"2024-03-01 12:00:00: 21.5").unwrap();
        assert_eq!(record.timestamp_raw, "2024-03-01 12:00:00");
        assert_eq!(record.value_raw, "21.5");
        assert_eq!(record.value, 21.5);
        assert_eq!(
            record.timestamp,
            NaiveDateTime::parse_from_str("2024-03-01 12:00:00", TIMESTAMP_FORMAT).unwrap()
        );
    }

    #[test]
    fn rejects_record_without_separator() {
        assert!(matches!(parse_record(b"garbage"), Err(WireError::Split(1))));
    }

    #[test]
    fn rejects_record_with_extra_separator() {
        // Three parts: the original tuple unpack fails on these too.
        assert!(matches!(
            parse_record(b"2024-03-01 12:00:00: 21.5: trailing"),
            Err(WireError::Split(3))
        ));
    }

    #[test]
    fn rejects_bad_timestamp() {
        assert!(matches!(
            parse_record(b"yesterday at noon: 21.5"),
            Err(WireError::Timestamp { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_value() {
        assert!(matches!(
            parse_record(b"2024-03-01 12:00:00: warm"),
            Err(WireError::Value { .. })
        ));
    }

    #[test]
    fn format_then_parse_round_trips() {
        let ts = NaiveDateTime::parse_from_str("2024-03-01 12:00:00", TIMESTAMP_FORMAT).unwrap();
        let wire = format_record(ts, "42.0");
        let record = parse_record(wire.as_bytes()).unwrap();
        assert_eq!(record.timestamp, ts);
        assert_eq!(record.value, 42.0);
    }
}
