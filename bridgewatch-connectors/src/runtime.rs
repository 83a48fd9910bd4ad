//! Async boundary for blocking resolvers
//!
//! Resolvers do blocking I/O. Inside a tokio service they run on the blocking
//! pool and are bounded by a timeout, so a hung file store turns into a
//! [`SourceError::Timeout`] instead of a stuck request.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use bridgewatch_connectors::{runtime, DirectorySource};
//! use bridgewatch_core::time::SystemClock;
//! use bridgewatch_core::{ApiResponse, IngestConfig, IngestPipeline};
//!
//! # async fn handler() {
//! let pipeline = Arc::new(IngestPipeline::new(
//!     DirectorySource::new("/var/lib/bridgewatch/mirror"),
//!     IngestConfig::default(),
//!     SystemClock,
//! ));
//!
//! let result = runtime::fetch_recent(pipeline, Some("5".into()), Duration::from_secs(8)).await;
//! let response = ApiResponse::from_result(result);
//! println!("{} {}", response.status_code(), response.to_json().unwrap_or_default());
//! # }
//! ```
//!
//! The underlying blocking call keeps running to completion after a timeout;
//! only the caller stops waiting for it.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::task::{self, JoinError};
use tokio::time;

use bridgewatch_core::time::TimeSource;
use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};
use bridgewatch_core::{IngestError, IngestPipeline, IngestResult, RecentData};

fn timeout_error(after: Duration) -> SourceError {
    SourceError::Timeout {
        after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
    }
}

fn join_error(err: JoinError) -> SourceError {
    SourceError::Transport(format!("resolver task failed: {}", err))
}

/// Run `fetch_raw_csv` on the blocking pool, giving up after `after`
pub async fn fetch_with_timeout<R>(
    resolver: Arc<R>,
    after: Duration,
) -> Result<Option<CsvSource>, SourceError>
where
    R: SourceResolver + ?Sized + 'static,
{
    let name = resolver.name().to_string();
    let handle = task::spawn_blocking(move || resolver.fetch_raw_csv());

    match time::timeout(after, handle).await {
        Ok(joined) => joined.map_err(join_error)?,
        Err(_) => {
            warn!("resolver '{}' exceeded {}ms", name, after.as_millis());
            Err(timeout_error(after))
        }
    }
}

/// Full request path: resolve, parse and window with a hard time limit
///
/// `minutes` is the raw query parameter and goes through the pipeline's
/// window policy.
pub async fn fetch_recent<R, C>(
    pipeline: Arc<IngestPipeline<R, C>>,
    minutes: Option<String>,
    after: Duration,
) -> IngestResult<RecentData>
where
    R: SourceResolver + 'static,
    C: TimeSource + 'static,
{
    let resolver = pipeline.resolver().name().to_string();
    let handle = task::spawn_blocking(move || pipeline.fetch_recent_query(minutes.as_deref()));

    match time::timeout(after, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => Err(IngestError::Source {
            resolver,
            source: join_error(err),
        }),
        Err(_) => {
            warn!("request against '{}' exceeded {}ms", resolver, after.as_millis());
            Err(IngestError::Source {
                resolver,
                source: timeout_error(after),
            })
        }
    }
}
