//! Inline source for fixtures and tests
//!
//! Serves a fixed CSV document, or nothing at all, from memory.

use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};

/// Resolver returning a fixed document
#[derive(Debug, Clone)]
pub struct InlineSource {
    name: String,
    source: Option<CsvSource>,
}

impl InlineSource {
    /// Serve `content` under `filename`
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: "inline".to_string(),
            source: Some(CsvSource::new(filename, content)),
        }
    }

    /// Source that is healthy but never has data
    pub fn empty() -> Self {
        Self {
            name: "inline".to_string(),
            source: None,
        }
    }

    /// Override the resolver name used in logs and stats
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl SourceResolver for InlineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        Ok(self.source.clone())
    }
}
