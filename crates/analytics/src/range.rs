//! Report time ranges and bucket sizes.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// A half-open time range: `start` inclusive, `end` exclusive.
///
/// Half-open bounds mean adjacent ranges tile the timeline with no gaps
/// and no double counting on the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    /// First instant inside the range.
    pub start: DateTime<Utc>,

    /// First instant past the range.
    pub end: DateTime<Utc>,
}

impl ReportRange {
    /// Creates a range from start (inclusive) to end (exclusive).
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days`-day range ending at `end`.
    pub fn days_ending_at(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    /// The range of equal length immediately before this one, for
    /// period-over-period comparisons.
    pub fn previous(&self) -> Self {
        let length = self.end - self.start;
        Self {
            start: self.start - length,
            end: self.start,
        }
    }

    /// Returns true if the range contains no time at all.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Bucket size for time-series reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    /// One bucket per calendar day (UTC).
    Day,

    /// One bucket per ISO week, starting Monday.
    Week,

    /// One bucket per calendar month.
    Month,
}

impl TimeBucket {
    /// Maps a date to the first day of its bucket.
    pub fn floor(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => date,
            TimeBucket::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            TimeBucket::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// The first day of the bucket after the one starting at `start`.
    pub fn next(&self, start: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => start + Duration::days(1),
            TimeBucket::Week => start + Duration::days(7),
            TimeBucket::Month => {
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start)
            }
        }
    }

    /// Parses a bucket from its query-string name.
    pub fn parse(s: &str) -> Option<TimeBucket> {
        match s {
            "day" => Some(TimeBucket::Day),
            "week" => Some(TimeBucket::Week),
            "month" => Some(TimeBucket::Month),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_buckets_are_identity() {
        assert_eq!(TimeBucket::Day.floor(date(2024, 6, 15)), date(2024, 6, 15));
        assert_eq!(TimeBucket::Day.next(date(2024, 6, 15)), date(2024, 6, 16));
    }

    #[test]
    fn week_buckets_start_monday() {
        // 2024-06-15 is a Saturday; its week starts Monday 2024-06-10.
        assert_eq!(TimeBucket::Week.floor(date(2024, 6, 15)), date(2024, 6, 10));
        assert_eq!(TimeBucket::Week.floor(date(2024, 6, 10)), date(2024, 6, 10));
        assert_eq!(TimeBucket::Week.next(date(2024, 6, 10)), date(2024, 6, 17));
    }

    #[test]
    fn month_buckets_roll_over_december() {
        assert_eq!(TimeBucket::Month.floor(date(2024, 6, 15)), date(2024, 6, 1));
        assert_eq!(TimeBucket::Month.next(date(2024, 6, 1)), date(2024, 7, 1));
        assert_eq!(TimeBucket::Month.next(date(2024, 12, 1)), date(2025, 1, 1));
    }

    #[test]
    fn previous_range_tiles_without_overlap() {
        let range = ReportRange::new(
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        );
        let previous = range.previous();
        assert_eq!(previous.end, range.start);
        assert_eq!(previous.end - previous.start, range.end - range.start);
    }

    #[test]
    fn empty_range_detection() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(ReportRange::new(at, at).is_empty());
        assert!(!ReportRange::new(at, at + Duration::seconds(1)).is_empty());
    }

    #[test]
    fn bucket_parse() {
        assert_eq!(TimeBucket::parse("day"), Some(TimeBucket::Day));
        assert_eq!(TimeBucket::parse("week"), Some(TimeBucket::Week));
        assert_eq!(TimeBucket::parse("month"), Some(TimeBucket::Month));
        assert_eq!(TimeBucket::parse("hour"), None);
    }
}
