//! Error types for the ingestion pipeline
//!
//! ## Error Categories
//!
//! Only the request-level category ever reaches a caller; everything below it
//! degrades to "fewer valid samples".
//!
//! ### Request level ([`IngestError`])
//! - `SourceUnavailable`: no resolver produced CSV content. Surfaced as an
//!   explicit "no data" result, never replaced by synthetic rows.
//! - `Source`: a resolver failed hard (I/O, HTTP, timeout).
//!
//! ### Row level ([`RowError`])
//! - Wrong column count, too many fields, or a row without a single numeric
//!   value. Recovered inside the parser: the row is logged and skipped.
//!
//! ### Empty input
//! Header-only or empty CSV text is not an error at all; it yields an empty
//! sample sequence.
//!
//! ### Parameters
//! Invalid `minutes` values are replaced by the configured default and never
//! produce an error. See [`crate::window::WindowConfig`].

use thiserror::Error;

use crate::traits::SourceError;

/// Result type for request-level operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Request-level failures
#[derive(Error, Debug)]
pub enum IngestError {
    /// Every resolver came back empty
    #[error("No sensor data available from any source")]
    SourceUnavailable,

    /// A resolver failed in a way that is not "no data"
    #[error("Source '{resolver}' failed: {source}")]
    Source {
        /// Name of the failing resolver
        resolver: String,
        /// Underlying resolver error
        #[source]
        source: SourceError,
    },
}

impl IngestError {
    /// HTTP status the request layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SourceUnavailable => 404,
            Self::Source { .. } => 500,
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "source_unavailable",
            Self::Source { .. } => "source_error",
        }
    }
}

/// Reasons a single CSV row is skipped
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowError {
    /// Field count differs from the header
    #[error("expected {expected} fields, found {found}")]
    ColumnCount {
        /// Number of header columns
        expected: usize,
        /// Number of fields on the row
        found: usize,
    },

    /// Row has more fields than the parser can hold
    #[error("row exceeds {max} fields")]
    TooManyFields {
        /// Field capacity of the row splitter
        max: usize,
    },

    /// Every numeric column failed to parse
    #[error("no numeric value could be parsed")]
    NoNumericSignal,
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Input was not valid JSON for the config shape
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is out of bounds
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}
