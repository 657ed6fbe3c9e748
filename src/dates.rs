// Date parsing, interval bucketing and axis label formats

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label used for values that look like dates but cannot be parsed
pub const INVALID_DATE: &str = "Invalid date";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a date string. Offsets are normalized to UTC.
pub fn parse_date_str(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Integers with 10 digits read as unix seconds, 13 digits as unix milliseconds
pub fn is_timestamp(n: i64) -> bool {
    let digits = n.unsigned_abs().to_string().len();
    n > 0 && (digits == 10 || digits == 13)
}

fn timestamp_to_date(n: i64) -> Option<NaiveDateTime> {
    if !is_timestamp(n) {
        return None;
    }
    let dt = if n >= 1_000_000_000_000 {
        DateTime::<Utc>::from_timestamp_millis(n)
    } else {
        DateTime::<Utc>::from_timestamp(n, 0)
    };
    dt.map(|d| d.naive_utc())
}

/// Read a JSON value as a date; `None` is the invalid-date sentinel
pub fn value_to_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n.as_i64().and_then(timestamp_to_date),
        _ => None,
    }
}

/// Encode a date so that `value_to_date` reads it back unchanged
pub fn date_to_value(date: NaiveDateTime) -> Value {
    Value::String(date.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
}

// =============================================================================
// Intervals
// =============================================================================

/// Bucket width for time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl TimeInterval {
    /// Start of the bucket containing `date`. Weeks start on Sunday.
    pub fn floor(&self, date: NaiveDateTime) -> NaiveDateTime {
        let day = date.date();
        let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);
        match self {
            TimeInterval::Hour => midnight(day) + Duration::hours(date.hour() as i64),
            TimeInterval::Day => midnight(day),
            TimeInterval::Week => {
                midnight(day) - Duration::days(day.weekday().num_days_from_sunday() as i64)
            }
            TimeInterval::Month => midnight(day) - Duration::days(day.day0() as i64),
            TimeInterval::Year => midnight(day) - Duration::days(day.ordinal0() as i64),
        }
    }

    /// Start of the bucket following the one containing `date`
    pub fn advance(&self, date: NaiveDateTime) -> NaiveDateTime {
        let start = self.floor(date);
        match self {
            TimeInterval::Hour => start + Duration::hours(1),
            TimeInterval::Day => start + Duration::days(1),
            TimeInterval::Week => start + Duration::days(7),
            TimeInterval::Month => start
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDateTime::MAX),
            TimeInterval::Year => start
                .checked_add_months(Months::new(12))
                .unwrap_or(NaiveDateTime::MAX),
        }
    }

    /// Bucket starts covering `[start, end]`, both ends inclusive
    pub fn buckets(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
        let mut out = Vec::new();
        let mut bucket = self.floor(start);
        while bucket <= end {
            out.push(bucket);
            let next = self.advance(bucket);
            if next <= bucket {
                break;
            }
            bucket = next;
        }
        out
    }
}

/// Last millisecond of the day containing `date`
pub fn end_of_day(date: NaiveDateTime) -> NaiveDateTime {
    TimeInterval::Day.floor(date) + Duration::days(1) - Duration::milliseconds(1)
}

// =============================================================================
// Date windows
// =============================================================================

/// Inclusive date range used for filtering and gap-filling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    /// Build the window from stored bounds. A rolling window keeps the stored
    /// span in whole days but ends at the end of `now`'s day.
    pub fn resolve(
        start: NaiveDateTime,
        end: NaiveDateTime,
        rolling: bool,
        now: NaiveDateTime,
    ) -> Self {
        if !rolling {
            return Self { start, end };
        }
        let span = (end - start).num_days();
        let end = end_of_day(now);
        let start = TimeInterval::Day.floor(end - Duration::days(span));
        Self { start, end }
    }
}

// =============================================================================
// Label formats
// =============================================================================

/// Display format for date keys, chosen once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `MMM Do hA`
    HourOfDay,
    /// `YYYY/MM/DD hA`
    HourWithYear,
    /// `MMM D`
    Day,
    /// `YYYY MMM D`
    DayWithYear,
    /// `MMM [w] w`
    Week,
    /// `YYYY MMM [w] w`
    WeekWithYear,
    /// `MMM`
    Month,
    /// `MMM YYYY`
    MonthWithYear,
    /// `YYYY`
    Year,
}

impl DateFormat {
    /// Pick the format for an interval given the first and last date on the axis
    pub fn select(
        interval: TimeInterval,
        first: Option<NaiveDateTime>,
        last: Option<NaiveDateTime>,
    ) -> Self {
        let crosses_year = match (first, last) {
            (Some(a), Some(b)) => a.year() != b.year(),
            _ => false,
        };
        match (interval, crosses_year) {
            (TimeInterval::Hour, false) => DateFormat::HourOfDay,
            (TimeInterval::Hour, true) => DateFormat::HourWithYear,
            (TimeInterval::Day, false) => DateFormat::Day,
            (TimeInterval::Day, true) => DateFormat::DayWithYear,
            (TimeInterval::Week, false) => DateFormat::Week,
            (TimeInterval::Week, true) => DateFormat::WeekWithYear,
            (TimeInterval::Month, false) => DateFormat::Month,
            (TimeInterval::Month, true) => DateFormat::MonthWithYear,
            (TimeInterval::Year, _) => DateFormat::Year,
        }
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::HourOfDay => "MMM Do hA",
            DateFormat::HourWithYear => "YYYY/MM/DD hA",
            DateFormat::Day => "MMM D",
            DateFormat::DayWithYear => "YYYY MMM D",
            DateFormat::Week => "MMM [w] w",
            DateFormat::WeekWithYear => "YYYY MMM [w] w",
            DateFormat::Month => "MMM",
            DateFormat::MonthWithYear => "MMM YYYY",
            DateFormat::Year => "YYYY",
        }
    }

    pub fn render(&self, date: Option<NaiveDateTime>) -> String {
        let Some(dt) = date else {
            return INVALID_DATE.to_string();
        };
        match self {
            DateFormat::HourOfDay => {
                format!("{} {} {}", dt.format("%b"), ordinal(dt.day()), hour12(&dt))
            }
            DateFormat::HourWithYear => format!("{} {}", dt.format("%Y/%m/%d"), hour12(&dt)),
            DateFormat::Day => dt.format("%b %-d").to_string(),
            DateFormat::DayWithYear => dt.format("%Y %b %-d").to_string(),
            DateFormat::Week => format!("{} w {}", dt.format("%b"), us_week(&dt)),
            DateFormat::WeekWithYear => format!("{} w {}", dt.format("%Y %b"), us_week(&dt)),
            DateFormat::Month => dt.format("%b").to_string(),
            DateFormat::MonthWithYear => dt.format("%b %Y").to_string(),
            DateFormat::Year => dt.format("%Y").to_string(),
        }
    }
}

fn hour12(dt: &NaiveDateTime) -> String {
    let (pm, hour) = dt.hour12();
    format!("{}{}", hour, if pm { "PM" } else { "AM" })
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

/// Week of year with Sunday-start weeks where week 1 holds January 1st
pub fn us_week(dt: &NaiveDateTime) -> u32 {
    let date = dt.date();
    let saturday = date + Duration::days(6 - date.weekday().num_days_from_sunday() as i64);
    saturday.ordinal0() / 7 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dt(s: &str) -> NaiveDateTime {
        parse_date_str(s).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(dt("2023-03-05"), dt("2023-03-05T00:00:00"));
        assert_eq!(dt("2023/03/05"), dt("2023-03-05 00:00"));
        assert_eq!(dt("2023-03-05T10:00:00+02:00"), dt("2023-03-05T08:00:00Z"));
        assert_eq!(dt("2023-03-05T08:00:00.250"), dt("2023-03-05T08:00:00.250Z"));
        assert!(parse_date_str("yesterday").is_none());
        assert!(parse_date_str("2023-13-01").is_none());
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(value_to_date(&json!(1672531200)), Some(dt("2023-01-01")));
        assert_eq!(value_to_date(&json!(1672531200000_i64)), Some(dt("2023-01-01")));
        assert!(value_to_date(&json!(42)).is_none());
        assert!(!is_timestamp(12345));
    }

    #[test]
    fn test_date_value_roundtrip() {
        let d = dt("2023-05-01T12:30:15.125");
        assert_eq!(value_to_date(&date_to_value(d)), Some(d));
    }

    #[test]
    fn test_floor() {
        let d = dt("2023-03-15T13:45:00"); // a Wednesday
        assert_eq!(TimeInterval::Hour.floor(d), dt("2023-03-15T13:00:00"));
        assert_eq!(TimeInterval::Day.floor(d), dt("2023-03-15"));
        assert_eq!(TimeInterval::Week.floor(d), dt("2023-03-12"));
        assert_eq!(TimeInterval::Month.floor(d), dt("2023-03-01"));
        assert_eq!(TimeInterval::Year.floor(d), dt("2023-01-01"));
    }

    #[test]
    fn test_advance_month_end() {
        assert_eq!(TimeInterval::Month.advance(dt("2023-01-31")), dt("2023-02-01"));
        assert_eq!(TimeInterval::Year.advance(dt("2023-06-01")), dt("2024-01-01"));
    }

    #[test]
    fn test_buckets_include_last() {
        let buckets = TimeInterval::Day.buckets(dt("2023-01-01"), dt("2023-01-05"));
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[4], dt("2023-01-05"));

        let months = TimeInterval::Month.buckets(dt("2023-01-20"), dt("2023-03-02"));
        assert_eq!(months, vec![dt("2023-01-01"), dt("2023-02-01"), dt("2023-03-01")]);
    }

    #[test]
    fn test_rolling_window() {
        let now = dt("2023-06-10T15:00:00");
        let window = DateWindow::resolve(dt("2023-01-01"), dt("2023-01-08"), true, now);
        assert_eq!(window.end, dt("2023-06-10T23:59:59.999"));
        assert_eq!(window.start, dt("2023-06-03"));

        let fixed = DateWindow::resolve(dt("2023-01-01"), dt("2023-01-08"), false, now);
        assert_eq!(fixed.start, dt("2023-01-01"));
    }

    #[test]
    fn test_select_format() {
        let a = Some(dt("2022-12-30"));
        let b = Some(dt("2023-01-02"));
        assert_eq!(DateFormat::select(TimeInterval::Day, a, a), DateFormat::Day);
        assert_eq!(DateFormat::select(TimeInterval::Day, a, b), DateFormat::DayWithYear);
        assert_eq!(DateFormat::select(TimeInterval::Month, a, b), DateFormat::MonthWithYear);
        assert_eq!(DateFormat::select(TimeInterval::Year, a, a), DateFormat::Year);
    }

    #[test]
    fn test_render() {
        let d = Some(dt("2023-01-02T15:00:00"));
        assert_eq!(DateFormat::Day.render(d), "Jan 2");
        assert_eq!(DateFormat::DayWithYear.render(d), "2023 Jan 2");
        assert_eq!(DateFormat::HourOfDay.render(d), "Jan 2nd 3PM");
        assert_eq!(DateFormat::HourWithYear.render(d), "2023/01/02 3PM");
        assert_eq!(DateFormat::Week.render(d), "Jan w 1");
        assert_eq!(DateFormat::MonthWithYear.render(d), "Jan 2023");
        assert_eq!(DateFormat::Year.render(d), "2023");
        assert_eq!(DateFormat::Day.render(None), INVALID_DATE);
    }

    #[test]
    fn test_us_week() {
        assert_eq!(us_week(&dt("2023-01-01")), 1);
        assert_eq!(us_week(&dt("2023-01-08")), 2);
        assert_eq!(us_week(&dt("2022-01-01")), 1);
        assert_eq!(us_week(&dt("2022-12-31")), 53);
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }
}
