//! Timestamp resolution for CSV rows
//!
//! Each row carries up to two timestamp-like columns (`timestamp`, then
//! `created_at`). Resolution runs in three passes over those candidates:
//!
//! 1. The first value that parses as a full datetime wins.
//! 2. Otherwise the first bare time of day (`HH:MM:SS`) is anchored to a
//!    calendar date according to [`BareTimePolicy`].
//! 3. Otherwise the row is stamped with the parse time.
//!
//! ## Bare times
//!
//! Device files only record the time of day. Anchoring them to the parse-time
//! date means two files holding the same `HH:MM:SS` parsed on different days
//! produce different absolute timestamps, and a file captured late yesterday
//! parsed just after midnight lands in the future. That is a known limitation
//! of the file format; [`BareTimePolicy::RollBackIfFuture`] narrows it.
//!
//! Naive datetimes and bare times are interpreted in a configurable fixed UTC
//! offset (UTC by default).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, MS_PER_DAY};

/// Formats with an explicit offset
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Formats without an offset, interpreted in the configured offset
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const BARE_TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// How a bare `HH:MM:SS` value becomes an absolute timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BareTimePolicy {
    /// Combine with the parse-time calendar date
    #[default]
    CombineWithToday,
    /// Like `CombineWithToday`, but a result later than the parse time is
    /// moved back one day
    RollBackIfFuture,
    /// Ignore bare times; such rows are stamped with the parse time
    ParseTime,
}

/// Which rule produced a row's timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampOrigin {
    /// Full datetime column
    DateTime,
    /// Bare time anchored to a date
    BareTime,
    /// No usable column; parse time was used
    ParseTime,
}

/// Resolves row timestamps against a single "now" captured per parse
#[derive(Debug, Clone, Copy)]
pub struct TimestampResolver {
    now: Timestamp,
    offset: FixedOffset,
    policy: BareTimePolicy,
}

impl TimestampResolver {
    /// Resolver for one parse pass
    pub fn new(now: Timestamp, offset: FixedOffset, policy: BareTimePolicy) -> Self {
        Self { now, offset, policy }
    }

    /// Parse time this resolver falls back to
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Resolve a row timestamp from candidate values in precedence order
    pub fn resolve<'a, I>(&self, candidates: I) -> (Timestamp, TimestampOrigin)
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: Clone,
    {
        let candidates = candidates.into_iter();

        if let Some(ts) = candidates
            .clone()
            .find_map(|value| parse_datetime(value, self.offset))
        {
            return (ts, TimestampOrigin::DateTime);
        }

        if self.policy != BareTimePolicy::ParseTime {
            if let Some(ts) = candidates
                .filter_map(parse_bare_time)
                .find_map(|time| self.anchor(time))
            {
                return (ts, TimestampOrigin::BareTime);
            }
        }

        (self.now, TimestampOrigin::ParseTime)
    }

    fn anchor(&self, time: NaiveTime) -> Option<Timestamp> {
        let today = DateTime::from_timestamp_millis(self.now)?
            .with_timezone(&self.offset)
            .date_naive();
        let ts = self
            .offset
            .from_local_datetime(&today.and_time(time))
            .single()?
            .timestamp_millis();

        match self.policy {
            BareTimePolicy::RollBackIfFuture if ts > self.now => Some(ts - MS_PER_DAY),
            _ => Some(ts),
        }
    }
}

/// Parse a full datetime into epoch milliseconds
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` with an optional offset or a
/// trailing `UTC`/`Z`, a few naive variants, and plain dates (midnight).
pub fn parse_datetime(value: &str, offset: FixedOffset) -> Option<Timestamp> {
    let value = value.trim().trim_matches('"').trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.timestamp_millis());
        }
    }

    // "2024-01-15 10:30:00 UTC" as exported by ThingSpeak
    let (naive_text, zone) = match value
        .strip_suffix("UTC")
        .or_else(|| value.strip_suffix('Z'))
    {
        Some(rest) => (rest.trim_end(), FixedOffset::east_opt(0)?),
        None => (value, offset),
    };

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_text, format) {
            return zone
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(naive_text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| zone.from_local_datetime(&naive).single())
        .map(|dt| dt.timestamp_millis())
}

/// Parse a bare time of day (`HH:MM:SS`, `HH:MM:SS.fff` or `HH:MM`)
pub fn parse_bare_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim().trim_matches('"').trim();
    BARE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-15T10:30:00Z
    const NOW: Timestamp = 1_705_314_600_000;
    // 2024-01-15T00:00:00Z
    const MIDNIGHT: Timestamp = 1_705_276_800_000;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn resolver(policy: BareTimePolicy) -> TimestampResolver {
        TimestampResolver::new(NOW, utc(), policy)
    }

    #[test]
    fn datetime_formats() {
        let expected = Some(NOW);
        assert_eq!(parse_datetime("2024-01-15T10:30:00Z", utc()), expected);
        assert_eq!(parse_datetime("2024-01-15T10:30:00+00:00", utc()), expected);
        assert_eq!(parse_datetime("2024-01-15T12:30:00+02:00", utc()), expected);
        assert_eq!(parse_datetime("2024-01-15 10:30:00 UTC", utc()), expected);
        assert_eq!(parse_datetime("2024-01-15 10:30:00", utc()), expected);
        assert_eq!(parse_datetime("\"2024-01-15T10:30:00.000Z\"", utc()), expected);
        assert_eq!(parse_datetime("2024-01-15", utc()), Some(MIDNIGHT));
    }

    #[test]
    fn naive_datetime_uses_configured_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(parse_datetime("2024-01-15 12:30:00", plus_two), Some(NOW));
        // Explicit UTC suffix ignores the configured offset
        assert_eq!(parse_datetime("2024-01-15 10:30:00 UTC", plus_two), Some(NOW));
    }

    #[test]
    fn rejects_non_datetimes() {
        assert_eq!(parse_datetime("10:30:00", utc()), None);
        assert_eq!(parse_datetime("", utc()), None);
        assert_eq!(parse_datetime("N/A", utc()), None);
        assert_eq!(parse_datetime("25.437", utc()), None);
    }

    #[test]
    fn bare_time_formats() {
        assert_eq!(parse_bare_time("10:30:00"), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(parse_bare_time("10:30"), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(
            parse_bare_time("10:30:00.250"),
            NaiveTime::from_hms_milli_opt(10, 30, 0, 250)
        );
        assert_eq!(parse_bare_time("25:00:00"), None);
        assert_eq!(parse_bare_time("abc"), None);
    }

    #[test]
    fn bare_time_combines_with_today() {
        let (ts, origin) = resolver(BareTimePolicy::CombineWithToday).resolve(["10:29:30"]);
        assert_eq!(origin, TimestampOrigin::BareTime);
        assert_eq!(ts, NOW - 30_000);

        // Later than now stays on today's date
        let (ts, _) = resolver(BareTimePolicy::CombineWithToday).resolve(["23:00:00"]);
        assert_eq!(ts, MIDNIGHT + 23 * 3_600_000);
    }

    #[test]
    fn roll_back_if_future() {
        let (ts, origin) = resolver(BareTimePolicy::RollBackIfFuture).resolve(["23:00:00"]);
        assert_eq!(origin, TimestampOrigin::BareTime);
        assert_eq!(ts, MIDNIGHT - 3_600_000);

        let (ts, _) = resolver(BareTimePolicy::RollBackIfFuture).resolve(["10:00:00"]);
        assert_eq!(ts, NOW - 30 * 60_000);
    }

    #[test]
    fn parse_time_policy_ignores_bare_times() {
        let (ts, origin) = resolver(BareTimePolicy::ParseTime).resolve(["10:00:00"]);
        assert_eq!(origin, TimestampOrigin::ParseTime);
        assert_eq!(ts, NOW);
    }

    #[test]
    fn full_datetime_beats_bare_time_regardless_of_position() {
        let (ts, origin) =
            resolver(BareTimePolicy::CombineWithToday).resolve(["09:00:00", "2024-01-14T08:00:00Z"]);
        assert_eq!(origin, TimestampOrigin::DateTime);
        assert_eq!(ts, MIDNIGHT - 16 * 3_600_000);
    }

    #[test]
    fn unparseable_falls_back_to_parse_time() {
        let (ts, origin) = resolver(BareTimePolicy::CombineWithToday).resolve(["garbage", ""]);
        assert_eq!(origin, TimestampOrigin::ParseTime);
        assert_eq!(ts, NOW);

        let (ts, origin) = resolver(BareTimePolicy::CombineWithToday).resolve(std::iter::empty());
        assert_eq!(origin, TimestampOrigin::ParseTime);
        assert_eq!(ts, NOW);
    }

    #[test]
    fn bare_time_anchors_to_local_date() {
        // 2024-01-15T23:30:00Z is already 2024-01-16 at +02:00
        let late = MIDNIGHT + 23 * 3_600_000 + 30 * 60_000;
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let resolver = TimestampResolver::new(late, plus_two, BareTimePolicy::CombineWithToday);

        // 01:00 local on the 16th = 2024-01-15T23:00:00Z
        let (ts, _) = resolver.resolve(["01:00:00"]);
        assert_eq!(ts, MIDNIGHT + 23 * 3_600_000);
    }
}
