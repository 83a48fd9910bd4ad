//! Extension points of the ingestion pipeline
//!
//! ## Module Organization
//!
//! - [`source`] - where raw CSV text comes from ([`SourceResolver`])
//! - [`store`] - device registry repository ([`DeviceStore`])
//!
//! The clock abstraction lives in [`crate::time`] and is re-exported here so
//! all seams can be imported from one place.
//!
//! ```rust
//! use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};
//!
//! struct Fixture;
//!
//! impl SourceResolver for Fixture {
//!     fn name(&self) -> &str {
//!         "fixture"
//!     }
//!
//!     fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
//!         Ok(Some(CsvSource::new("a.csv", "Device,Timestamp,X\nD1,10:00:00,1.5\n")))
//!     }
//! }
//!
//! assert!(Fixture.fetch_raw_csv().unwrap().is_some());
//! ```

pub mod source;
pub mod store;

pub use source::{CsvSource, SourceError, SourceResolver};
pub use store::{DeviceInput, DeviceRecord, DeviceStore, StoreError};

pub use crate::time::TimeSource;
