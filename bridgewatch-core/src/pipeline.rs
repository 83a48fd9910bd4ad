//! Request-level ingestion: resolve, parse, window
//!
//! ```text
//! SourceResolver ──> CsvParser ──> select_recent ──> RecentData
//! ```
//!
//! Every call re-fetches and re-parses; nothing is cached between requests.
//! A resolver that has no content produces [`IngestError::SourceUnavailable`].
//! Parse-level irregularities only reduce the number of samples.
//!
//! ```rust
//! use bridgewatch_core::{IngestConfig, IngestPipeline};
//! use bridgewatch_core::time::FixedClock;
//! use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};
//!
//! struct Latest;
//!
//! impl SourceResolver for Latest {
//!     fn name(&self) -> &str { "latest" }
//!     fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
//!         Ok(Some(CsvSource::new(
//!             "bridge_0001.csv",
//!             "Device,Timestamp,X,Y,Z\nD1,10:29:30,0.1,0.2,9.8\nD1,10:20:00,0.1,0.2,9.8\n",
//!         )))
//!     }
//! }
//!
//! let pipeline = IngestPipeline::new(Latest, IngestConfig::default(), FixedClock::new(1_705_314_600_000));
//! let recent = pipeline.fetch_recent_query(Some("1")).unwrap();
//!
//! assert_eq!(recent.total_points, 2);
//! assert_eq!(recent.recent_points(), 1);
//! ```

use log::{debug, info};

use crate::config::IngestConfig;
use crate::csv::{CsvParser, CsvVocabulary, ParseStats};
use crate::errors::{IngestError, IngestResult};
use crate::sample::SensorSample;
use crate::time::{Timestamp, TimeSource};
use crate::traits::{CsvSource, SourceResolver};
use crate::window::{latest_timestamp, select_recent, WindowConfig};

/// Windowed view of one fetched file
#[derive(Debug, Clone, PartialEq)]
pub struct RecentData {
    /// File the samples came from
    pub filename: String,
    /// Samples inside the window, newest first
    pub samples: Vec<SensorSample>,
    /// Samples parsed from the whole file
    pub total_points: usize,
    /// Window that was applied
    pub minutes: f64,
    /// Newest timestamp in the whole file
    pub last_update: Option<Timestamp>,
    /// Header vocabulary of the file
    pub vocabulary: Option<CsvVocabulary>,
    /// Parser counters
    pub stats: ParseStats,
}

impl RecentData {
    /// Samples inside the window
    pub fn recent_points(&self) -> usize {
        self.samples.len()
    }

    /// True when the file had data but none of it is recent
    pub fn is_stale(&self) -> bool {
        self.total_points > 0 && self.samples.is_empty()
    }
}

/// Resolver, parser and window policy wired together
pub struct IngestPipeline<R, C> {
    resolver: R,
    parser: CsvParser,
    window: WindowConfig,
    clock: C,
}

impl<R: SourceResolver, C: TimeSource> IngestPipeline<R, C> {
    /// Pipeline over `resolver`, reading "now" from `clock`
    pub fn new(resolver: R, config: IngestConfig, clock: C) -> Self {
        Self {
            resolver,
            parser: CsvParser::new(config.parser),
            window: config.window,
            clock,
        }
    }

    /// The configured resolver
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Window bounds in use
    pub fn window(&self) -> &WindowConfig {
        &self.window
    }

    /// Clock used for "now"
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fetch raw CSV, mapping "nothing there" to `SourceUnavailable`
    pub fn resolve(&self) -> IngestResult<CsvSource> {
        match self.resolver.fetch_raw_csv() {
            Ok(Some(source)) if !source.is_blank() => {
                debug!("resolver '{}' supplied {}", self.resolver.name(), source.filename);
                Ok(source)
            }
            Ok(_) => Err(IngestError::SourceUnavailable),
            Err(source) => Err(IngestError::Source {
                resolver: self.resolver.name().to_string(),
                source,
            }),
        }
    }

    /// Parse and window an already fetched file
    pub fn process(&self, source: &CsvSource, requested_minutes: Option<f64>) -> RecentData {
        let now = self.clock.now();
        let outcome = self.parser.parse_at(&source.content, now);
        let minutes = self.window.effective_minutes(requested_minutes);
        let samples = select_recent(&outcome.samples, minutes, now);

        info!(
            "{}: {} samples parsed, {} within {} min",
            source.filename,
            outcome.samples.len(),
            samples.len(),
            minutes
        );

        RecentData {
            filename: source.filename.clone(),
            total_points: outcome.samples.len(),
            last_update: latest_timestamp(&outcome.samples),
            samples,
            minutes,
            vocabulary: outcome.vocabulary,
            stats: outcome.stats,
        }
    }

    /// Every parsed sample of the current file, in file order
    pub fn fetch_all(&self) -> IngestResult<Vec<SensorSample>> {
        let source = self.resolve()?;
        Ok(self.parser.parse(&source.content, &self.clock).samples)
    }

    /// Fetch, parse and window with `minutes` normalized by the window policy
    pub fn fetch_recent(&self, minutes: Option<f64>) -> IngestResult<RecentData> {
        let source = self.resolve()?;
        Ok(self.process(&source, minutes))
    }

    /// Same as [`fetch_recent`](Self::fetch_recent) with the raw `minutes`
    /// query parameter
    pub fn fetch_recent_query(&self, minutes: Option<&str>) -> IngestResult<RecentData> {
        let minutes = self.window.minutes_from_query(minutes);
        self.fetch_recent(Some(f64::from(minutes)))
    }
}
