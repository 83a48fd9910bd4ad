//! Source resolver boundary
//!
//! The pipeline consumes exactly one capability: "give me the raw text of the
//! most recent CSV file, or tell me there is none". How that text is obtained
//! (local mirror directory, HTTP endpoint, fixture) is a resolver concern.
//!
//! ## Contract
//!
//! - `Ok(Some(source))` - CSV text in one of the known header vocabularies
//! - `Ok(None)` - the resolver is healthy but has nothing to offer
//! - `Err(e)` - the resolver failed (network, I/O, timeout)
//!
//! Callers must treat `Ok(None)` from every resolver as "no data available"
//! and surface it; fabricating rows is never acceptable.

use std::sync::Arc;

use thiserror::Error;

/// Raw CSV file handed over by a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSource {
    /// Name of the file the content came from
    pub filename: String,
    /// Full file content
    pub content: String,
}

impl CsvSource {
    /// Content read from `filename`
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// True when the content has no non-whitespace characters
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Resolver failures
#[derive(Debug, Error)]
pub enum SourceError {
    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote endpoint answered with an error status
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Network-level failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),

    /// Resolver did not finish in time
    #[error("Timed out after {after_ms}ms")]
    Timeout {
        /// Budget that was exceeded
        after_ms: u64,
    },

    /// Content was fetched but is not UTF-8 text
    #[error("Content is not valid UTF-8: {0}")]
    Decode(String),

    /// Resolver is misconfigured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure of one named resolver inside a composite resolver
    #[error("{name}: {source}")]
    Resolver {
        /// Name of the resolver that failed
        name: String,
        /// What went wrong
        #[source]
        source: Box<SourceError>,
    },
}

impl SourceError {
    /// Whether retrying the same resolver could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Io(_) | Self::Decode(_) | Self::Config(_) => false,
            Self::Resolver { source, .. } => source.is_retryable(),
        }
    }

    /// Attach the name of the resolver that produced this error
    pub fn in_resolver(self, name: impl Into<String>) -> Self {
        Self::Resolver {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error with any resolver names peeled off
    pub fn root(&self) -> &SourceError {
        match self {
            Self::Resolver { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Supplies raw CSV text from some external file store
///
/// Implementations are expected to be blocking; async callers should move
/// them onto a blocking pool and bound them with a timeout.
pub trait SourceResolver: Send + Sync {
    /// Short identifier used in logs and error messages
    fn name(&self) -> &str;

    /// Fetch the most recent CSV file
    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError>;
}

impl<R: SourceResolver + ?Sized> SourceResolver for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        (**self).fetch_raw_csv()
    }
}

impl<R: SourceResolver + ?Sized> SourceResolver for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        (**self).fetch_raw_csv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(CsvSource::new("a.csv", "  \n\r\n").is_blank());
        assert!(!CsvSource::new("a.csv", "Device\n").is_blank());
    }

    #[test]
    fn retryable_classification() {
        assert!(SourceError::Http { status: 503, message: String::new() }.is_retryable());
        assert!(SourceError::Http { status: 429, message: String::new() }.is_retryable());
        assert!(!SourceError::Http { status: 404, message: String::new() }.is_retryable());
        assert!(SourceError::Transport("reset".into()).is_retryable());
        assert!(!SourceError::Config("bad url".into()).is_retryable());
    }

    #[test]
    fn named_resolver_error() {
        let err = SourceError::Transport("reset".into()).in_resolver("mirror");
        assert_eq!(err.to_string(), "mirror: Transport error: reset");
        assert!(err.is_retryable());
        assert!(matches!(err.root(), SourceError::Transport(_)));

        let err = SourceError::Config("bad url".into()).in_resolver("primary");
        assert!(!err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }
}
