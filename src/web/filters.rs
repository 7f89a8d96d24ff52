//! Range Query Service — resolves a filter selector into a half-open time
//! interval evaluated against "now" at request time.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Date format accepted for custom bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The named time-window mode chosen by the dashboard user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeFilter {
    #[default]
    Today,
    Week,
    Month,
    Year,
    Custom,
}

impl RangeFilter {
    /// Parse the `filter` query parameter. Unrecognised values fall back to
    /// `Today`, same as an absent selector.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "week" => RangeFilter::Week,
            "month" => RangeFilter::Month,
            "year" => RangeFilter::Year,
            "custom" => RangeFilter::Custom,
            _ => RangeFilter::Today,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeFilter::Today => "today",
            RangeFilter::Week => "week",
            RangeFilter::Month => "month",
            RangeFilter::Year => "year",
            RangeFilter::Custom => "custom",
        }
    }
}

/// Rejected custom-range input. Surfaced to the requester as a visible
/// failure; a bad range is never silently swapped for a default one.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("custom range requires both start_date and end_date")]
    MissingCustomBounds,

    #[error("invalid date '{raw}': expected YYYY-MM-DD")]
    InvalidDate { raw: String },
}

/// Resolve a filter selector into `[start, end)`.
///
/// `custom` includes both endpoint dates in full (`end` is the day after
/// `end_date`). The relative selectors are windows ending at `now`; `today`
/// is the current calendar day.
pub fn resolve_range(
    filter: RangeFilter,
    start_date: Option<&str>,
    end_date: Option<&str>,
    now: NaiveDateTime,
) -> Result<(NaiveDateTime, NaiveDateTime), FilterError> {
    match filter {
        RangeFilter::Custom => {
            let (start_raw, end_raw) = match (start_date, end_date) {
                (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() => (s, e),
                _ => return Err(FilterError::MissingCustomBounds),
            };

            let start = parse_date(start_raw)?.and_time(NaiveTime::MIN);
            let end = parse_date(end_raw)?
                .checked_add_days(Days::new(1))
                .ok_or_else(|| FilterError::InvalidDate {
                    raw: end_raw.to_string(),
                })?
                .and_time(NaiveTime::MIN);
            Ok((start, end))
        }
        RangeFilter::Year => Ok((now - Duration::days(365), now)),
        RangeFilter::Month => Ok((now - Duration::days(30), now)),
        RangeFilter::Week => Ok((now - Duration::days(7), now)),
        RangeFilter::Today => {
            let midnight = now.date().and_time(NaiveTime::MIN);
            Ok((midnight, midnight + Duration::days(1)))
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| FilterError::InvalidDate {
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::TIMESTAMP_FORMAT;

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn today_spans_the_current_calendar_day() {
        let (start, end) =
            resolve_range(RangeFilter::Today, None, None, ts("2024-03-01 14:25:09")).unwrap();
        assert_eq!(start, ts("2024-03-01 00:00:00"));
        assert_eq!(end, ts("2024-03-02 00:00:00"));
    }

    #[test]
    fn today_at_exact_midnight() {
        let (start, end) =
            resolve_range(RangeFilter::Today, None, None, ts("2024-03-01 00:00:00")).unwrap();
        assert_eq!(start, ts("2024-03-01 00:00:00"));
        assert_eq!(end, ts("2024-03-02 00:00:00"));
    }

    #[test]
    fn relative_windows_end_at_now() {
        let now = ts("2024-03-01 14:25:09");
        for (filter, days) in [
            (RangeFilter::Week, 7),
            (RangeFilter::Month, 30),
            (RangeFilter::Year, 365),
        ] {
            let (start, end) = resolve_range(filter, None, None, now).unwrap();
            assert_eq!(end, now);
            assert_eq!(start, now - Duration::days(days));
        }
    }

    #[test]
    fn custom_range_includes_both_endpoint_days() {
        let (start, end) = resolve_range(
            RangeFilter::Custom,
            Some("2024-01-01"),
            Some("2024-01-03"),
            ts("2024-06-15 12:00:00"),
        )
        .unwrap();
        assert_eq!(start, ts("2024-01-01 00:00:00"));
        assert_eq!(end, ts("2024-01-04 00:00:00"));
    }

    #[test]
    fn custom_range_requires_both_dates() {
        let now = ts("2024-06-15 12:00:00");
        for (start, end) in [
            (None, None),
            (Some("2024-01-01"), None),
            (None, Some("2024-01-03")),
            (Some(""), Some("2024-01-03")),
        ] {
            assert!(matches!(
                resolve_range(RangeFilter::Custom, start, end, now),
                Err(FilterError::MissingCustomBounds)
            ));
        }
    }

    #[test]
    fn custom_range_rejects_malformed_dates() {
        let now = ts("2024-06-15 12:00:00");
        assert!(matches!(
            resolve_range(RangeFilter::Custom, Some("01/01/2024"), Some("2024-01-03"), now),
            Err(FilterError::InvalidDate { .. })
        ));
        assert!(matches!(
            resolve_range(RangeFilter::Custom, Some("2024-01-01"), Some("not-a-date"), now),
            Err(FilterError::InvalidDate { .. })
        ));
    }

    #[test]
    fn unknown_selector_falls_back_to_today() {
        assert_eq!(RangeFilter::parse("fortnight"), RangeFilter::Today);
        assert_eq!(RangeFilter::parse("custom"), RangeFilter::Custom);
        assert_eq!(RangeFilter::parse("week"), RangeFilter::Week);
    }
}
