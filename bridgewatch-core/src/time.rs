//! Clock abstraction for the ingestion pipeline
//!
//! Both the parser (bare `HH:MM:SS` times, parse-time fallback) and the
//! recency window read wall-clock time. Everything that reads the clock takes
//! a [`TimeSource`] so tests can pin "now":
//! - [`SystemClock`] reads the host wall clock
//! - [`FixedClock`] returns a controllable instant

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Timestamp in milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Milliseconds per second.
pub const MS_PER_SECOND: i64 = 1000;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;

/// Milliseconds per day.
pub const MS_PER_DAY: i64 = 24 * 60 * MS_PER_MINUTE;

/// Source of wall-clock time
///
/// Implementations must be cheap to call; the parser reads the clock once
/// per parse and the window selector once per selection.
///
/// ```rust
/// use bridgewatch_core::time::{FixedClock, TimeSource};
///
/// let clock = FixedClock::new(1_700_000_000_000);
/// assert_eq!(clock.now(), 1_700_000_000_000);
/// ```
pub trait TimeSource: Send + Sync {
    /// Current time in epoch milliseconds
    fn now(&self) -> Timestamp;

    /// Whether this source tracks real wall-clock time
    fn is_wall_clock(&self) -> bool;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}

/// Host wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
///
/// Interior atomics let a shared clock be moved forward while a pipeline
/// holds a reference to it.
#[derive(Debug, Default)]
pub struct FixedClock {
    timestamp: AtomicI64,
}

impl FixedClock {
    /// Clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: AtomicI64::new(timestamp),
        }
    }

    /// Jump to `timestamp`
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    /// Move the clock forward by `ms` milliseconds
    pub fn advance(&self, ms: i64) {
        self.timestamp.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clone for FixedClock {
    fn clone(&self) -> Self {
        Self::new(self.now())
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.timestamp.load(Ordering::SeqCst)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Convert epoch milliseconds to a UTC datetime, if representable
pub fn to_datetime(timestamp: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
}

/// Render a timestamp as RFC 3339 with millisecond precision
pub fn to_rfc3339(timestamp: Timestamp) -> Option<String> {
    to_datetime(timestamp).map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(500);
        assert_eq!(clock.now(), 1500);

        clock.set(42);
        assert_eq!(clock.now(), 42);
        assert!(!clock.is_wall_clock());
    }

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800_000);
        assert!(SystemClock.is_wall_clock());
    }

    #[test]
    fn rfc3339_rendering() {
        assert_eq!(
            to_rfc3339(1_705_314_600_000).as_deref(),
            Some("2024-01-15T10:30:00.000Z")
        );
    }

    #[test]
    fn clock_through_reference_and_box() {
        let clock = FixedClock::new(7);
        let by_ref: &dyn TimeSource = &clock;
        assert_eq!(by_ref.now(), 7);

        let boxed: Box<dyn TimeSource> = Box::new(FixedClock::new(9));
        assert_eq!(boxed.now(), 9);
    }
}
