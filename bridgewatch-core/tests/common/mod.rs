//! Common test utilities for integration tests
//!
//! This module provides:
//! - A frozen reference time and helpers to place rows relative to it
//! - CSV builders for both header vocabularies
//! - Resolver fixtures for every outcome of the source contract

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use bridgewatch_core::time::{to_rfc3339, Timestamp, MS_PER_SECOND};
use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};

/// 2024-01-15T10:30:00Z
pub const NOW: Timestamp = 1_705_314_600_000;

pub const DEVICE_HEADER: &str = "Device,Timestamp,X,Y,Z,Stroke_mm,Temperature_C";

pub const GENERIC_HEADER: &str = "created_at,entry_id,field1,field2,field3,field4";

/// RFC 3339 text for `NOW - seconds_ago`
pub fn iso_ago(seconds_ago: i64) -> String {
    to_rfc3339(NOW - seconds_ago * MS_PER_SECOND).expect("timestamp in range")
}

/// Device-format CSV with one row per age, timestamps in RFC 3339
pub fn device_csv(seconds_ago: &[i64]) -> String {
    let mut text = String::from(DEVICE_HEADER);
    text.push('\n');
    for (i, age) in seconds_ago.iter().enumerate() {
        text.push_str(&format!(
            "ACC-01,{},0.0{},-0.02,9.81,1.5,21.4\n",
            iso_ago(*age),
            i % 10
        ));
    }
    text
}

/// Generic-format CSV with one row per age
pub fn generic_csv(seconds_ago: &[i64]) -> String {
    let mut text = String::from(GENERIC_HEADER);
    text.push('\n');
    for (i, age) in seconds_ago.iter().enumerate() {
        text.push_str(&format!("{},{},0.12,0.98,115.0,22.5\n", iso_ago(*age), i + 1));
    }
    text
}

/// Resolver returning a fixed document
pub struct Fixture {
    pub source: Option<CsvSource>,
    calls: AtomicUsize,
}

impl Fixture {
    pub fn new(filename: &str, content: impl Into<String>) -> Self {
        Self {
            source: Some(CsvSource::new(filename, content)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            source: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SourceResolver for Fixture {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.source.clone())
    }
}

/// Resolver that always fails
pub struct Broken;

impl SourceResolver for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        Err(SourceError::Http {
            status: 503,
            message: "service unavailable".into(),
        })
    }
}
