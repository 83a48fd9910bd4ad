//! Recency window selection and sample merging
//!
//! ## Window
//!
//! ```text
//! cutoff = now - minutes * 60_000
//! recent = samples where timestamp >= cutoff, newest first
//! ```
//!
//! `now` is the wall clock at call time, never the newest sample. A stale
//! source therefore produces an empty window, which is how staleness shows up
//! to consumers instead of being masked.
//!
//! Ties keep their original relative order (stable sort). Inputs are never
//! mutated; every function returns a new collection.
//!
//! ## Minutes
//!
//! Requested minutes that are missing, non-numeric, NaN or not positive are
//! replaced with [`WindowConfig::default_minutes`]. The ceiling
//! ([`WindowConfig::max_minutes`]) bounds response size and can be disabled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::sample::{Readings, SensorSample};
use crate::time::{Timestamp, TimeSource, MS_PER_MINUTE};

/// Window used when the caller gives no usable value
pub const DEFAULT_WINDOW_MINUTES: u32 = 1;

/// Ceiling applied by default to caller-supplied windows
pub const DEFAULT_MAX_WINDOW_MINUTES: u32 = 10;

/// Window policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Minutes used when the request has no usable value
    pub default_minutes: u32,
    /// Upper bound for requested minutes; `None` disables clamping
    pub max_minutes: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_WINDOW_MINUTES,
            max_minutes: Some(DEFAULT_MAX_WINDOW_MINUTES),
        }
    }
}

impl WindowConfig {
    /// Window used when a request gives no minutes
    pub fn with_default_minutes(mut self, minutes: u32) -> Self {
        self.default_minutes = minutes;
        self
    }

    /// `None` removes the ceiling
    pub fn with_max_minutes(mut self, max: Option<u32>) -> Self {
        self.max_minutes = max;
        self
    }

    /// Default must be positive and within the ceiling
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.default_minutes",
                reason: "must be positive",
            });
        }
        match self.max_minutes {
            Some(0) => Err(ConfigError::InvalidValue {
                field: "window.max_minutes",
                reason: "must be positive",
            }),
            Some(max) if max < self.default_minutes => Err(ConfigError::InvalidValue {
                field: "window.max_minutes",
                reason: "must not be below default_minutes",
            }),
            _ => Ok(()),
        }
    }

    /// Normalize a requested window to the minutes actually used
    pub fn effective_minutes(&self, requested: Option<f64>) -> f64 {
        let minutes = match requested {
            Some(m) if m.is_finite() && m > 0.0 => m,
            _ => f64::from(self.default_minutes),
        };
        match self.max_minutes {
            Some(max) => minutes.min(f64::from(max)),
            None => minutes,
        }
    }

    /// Parse the `minutes` query parameter
    ///
    /// Integers are taken as-is, decimals are truncated. Absent, non-numeric
    /// and non-positive values give the default; the result is clamped to the
    /// ceiling.
    pub fn minutes_from_query(&self, raw: Option<&str>) -> u32 {
        let parsed = raw.map(str::trim).and_then(|text| {
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v.trunc() as i64)
            })
        });

        let minutes = match parsed {
            Some(m) if m > 0 => u32::try_from(m).unwrap_or(u32::MAX),
            _ => self.default_minutes,
        };
        match self.max_minutes {
            Some(max) => minutes.min(max),
            None => minutes,
        }
    }
}

/// Samples within `minutes` of `now`, newest first
///
/// Invalid `minutes` (NaN, infinite, zero or negative) behave like
/// [`DEFAULT_WINDOW_MINUTES`].
pub fn select_recent(samples: &[SensorSample], minutes: f64, now: Timestamp) -> Vec<SensorSample> {
    let minutes = if minutes.is_finite() && minutes > 0.0 {
        minutes
    } else {
        f64::from(DEFAULT_WINDOW_MINUTES)
    };
    let span = (minutes * MS_PER_MINUTE as f64).round() as i64;
    let cutoff = now.saturating_sub(span);

    let mut recent: Vec<SensorSample> = samples
        .iter()
        .filter(|sample| sample.timestamp >= cutoff)
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent
}

/// Window selector bound to a policy and a clock
#[derive(Debug, Clone, Default)]
pub struct WindowSelector<C> {
    config: WindowConfig,
    clock: C,
}

impl<C: TimeSource> WindowSelector<C> {
    /// Selector with the given bounds
    pub fn new(config: WindowConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// Active bounds
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Clock used for "now"
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Select with the policy applied to `requested` minutes
    pub fn select(&self, samples: &[SensorSample], requested: Option<f64>) -> Vec<SensorSample> {
        select_recent(samples, self.config.effective_minutes(requested), self.clock.now())
    }
}

/// Identity of one reading: passthrough fields, timestamp and the exact
/// bit pattern of every numeric value
type SampleKey<'a> = (
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Timestamp,
    [u64; 5],
);

fn sample_key(sample: &SensorSample) -> SampleKey<'_> {
    let values = match &sample.readings {
        Readings::Device(r) => [r.x, r.y, r.z, r.stroke_mm, r.temperature_c],
        Readings::Generic(r) => [r.vibration, r.acceleration, r.strain, r.temperature, 0.0],
    };
    (
        sample.device.as_deref(),
        sample.id.as_deref(),
        sample.created_at.as_deref(),
        sample.timestamp,
        values.map(f64::to_bits),
    )
}

/// Combine sample batches from repeated fetch attempts
///
/// A sample is dropped only when an earlier batch already delivered it;
/// rows inside one batch are never collapsed, even when they are identical
/// (several readings within the same second). A batch carrying a reading more
/// often than all earlier batches together contributes the extra copies.
/// First-seen order is preserved.
pub fn merge_samples<'a, I>(batches: I) -> Vec<SensorSample>
where
    I: IntoIterator<Item = &'a [SensorSample]>,
{
    let mut delivered: HashMap<SampleKey<'a>, usize> = HashMap::new();
    let mut merged = Vec::new();

    for batch in batches {
        let mut in_batch: HashMap<SampleKey<'a>, usize> = HashMap::new();
        for sample in batch {
            let key = sample_key(sample);
            let count = in_batch.entry(key).or_insert(0);
            *count += 1;
            if *count > delivered.get(&key).copied().unwrap_or(0) {
                merged.push(sample.clone());
            }
        }
        for (key, count) in in_batch {
            let total = delivered.entry(key).or_insert(0);
            *total = (*total).max(count);
        }
    }
    merged
}

/// Newest timestamp in a collection
pub fn latest_timestamp(samples: &[SensorSample]) -> Option<Timestamp> {
    samples.iter().map(|sample| sample.timestamp).max()
}
