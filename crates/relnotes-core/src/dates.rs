use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("start date must not be after end date")]
    InvalidRange,

    #[error("invalid date configuration: {0}")]
    InvalidConfiguration(String),
}

/// How the caller asked for a window: a trailing day count or explicit dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "dateMode")]
pub enum DateRangeRequest {
    Days {
        days: i64,
    },
    #[serde(rename_all = "camelCase")]
    Range {
        start_date: String,
        end_date: String,
    },
}

/// A concrete `[start, end]` instant pair, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Trailing window: `end = now`, `start = end - days`. `days` must be
    /// positive.
    pub fn last_days(days: i64) -> Result<DateRange, DateRangeError> {
        if days < 1 {
            return Err(DateRangeError::InvalidConfiguration(format!(
                "day count must be a positive integer, got {days}"
            )));
        }
        let end = Utc::now();
        let range = DateRange {
            start: end - Duration::days(days),
            end,
        };
        range.warn_if_over_year();
        Ok(range)
    }

    /// Explicit window from ISO dates (`YYYY-MM-DD`). The end date is
    /// inclusive: it maps to the end of that day.
    pub fn explicit(start: &str, end: &str) -> Result<DateRange, DateRangeError> {
        let start = parse_day_start(start)?;
        let end = parse_day_end(end)?;
        if start > end {
            return Err(DateRangeError::InvalidRange);
        }
        let range = DateRange { start, end };
        range.warn_if_over_year();
        Ok(range)
    }

    /// Resolve a request-level date specification into a concrete range.
    pub fn resolve(request: &DateRangeRequest) -> Result<DateRange, DateRangeError> {
        match request {
            DateRangeRequest::Days { days } => DateRange::last_days(*days),
            DateRangeRequest::Range {
                start_date,
                end_date,
            } => DateRange::explicit(start_date, end_date),
        }
    }

    /// Non-fatal advisory: very wide windows produce low-quality changelogs
    /// and burn search quota, but generation still proceeds.
    pub fn spans_over_year(&self) -> bool {
        self.end - self.start > Duration::days(365)
    }

    fn warn_if_over_year(&self) {
        if self.spans_over_year() {
            warn!(
                start = %self.start,
                end = %self.end,
                "date range spans more than 365 days; changelog may be very long"
            );
        }
    }
}

fn parse_day_start(input: &str) -> Result<DateTime<Utc>, DateRangeError> {
    let day = parse_day(input)?;
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| DateRangeError::InvalidConfiguration(input.to_string()))
}

fn parse_day_end(input: &str) -> Result<DateTime<Utc>, DateRangeError> {
    let day = parse_day(input)?;
    day.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| DateRangeError::InvalidConfiguration(input.to_string()))
}

fn parse_day(input: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|e| {
        DateRangeError::InvalidConfiguration(format!("unparseable date {input:?}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_days_spans_the_requested_window() {
        let range = DateRange::last_days(30).unwrap();
        assert_eq!(range.end - range.start, Duration::days(30));
        // end is "now" within a generous clock-skew tolerance
        assert!((Utc::now() - range.end).num_seconds().abs() < 5);
    }

    #[test]
    fn last_days_rejects_non_positive() {
        assert!(matches!(
            DateRange::last_days(0),
            Err(DateRangeError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            DateRange::last_days(-3),
            Err(DateRangeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn explicit_range_covers_both_days() {
        let range = DateRange::explicit("2024-01-01", "2024-02-01").unwrap();
        assert_eq!(range.start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(range.end.to_rfc3339(), "2024-02-01T23:59:59+00:00");
        assert!(!range.spans_over_year());
    }

    #[test]
    fn explicit_range_rejects_inverted_dates() {
        assert_eq!(
            DateRange::explicit("2024-02-01", "2024-01-01"),
            Err(DateRangeError::InvalidRange)
        );
    }

    #[test]
    fn explicit_range_rejects_garbage() {
        assert!(matches!(
            DateRange::explicit("not-a-date", "2024-01-01"),
            Err(DateRangeError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            DateRange::explicit("2024-01-01", "01/02/2024"),
            Err(DateRangeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn wide_ranges_are_flagged_but_allowed() {
        let range = DateRange::explicit("2020-01-01", "2024-01-01").unwrap();
        assert!(range.spans_over_year());

        let range = DateRange::last_days(400).unwrap();
        assert!(range.spans_over_year());
    }

    #[test]
    fn resolve_dispatches_on_mode() {
        let range = DateRange::resolve(&DateRangeRequest::Days { days: 7 }).unwrap();
        assert_eq!(range.end - range.start, Duration::days(7));

        let range = DateRange::resolve(&DateRangeRequest::Range {
            start_date: "2024-01-01".into(),
            end_date: "2024-01-31".into(),
        })
        .unwrap();
        assert_eq!(range.start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
