use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;

use crate::wire::TIMESTAMP_FORMAT;

/// Render a timestamp the way it is stored: `%Y-%m-%d %H:%M:%S` TEXT.
/// Lexicographic order of this format matches chronological order, so range
/// predicates compare the column directly.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|err| anyhow!("invalid {field} '{value}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trips() {
        let ts = parse_timestamp("2024-03-01 12:00:00", "timestamp").unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-01 12:00:00");
    }

    #[test]
    fn rejects_offset_timestamps() {
        assert!(parse_timestamp("2024-03-01T12:00:00+00:00", "timestamp").is_err());
    }
}
