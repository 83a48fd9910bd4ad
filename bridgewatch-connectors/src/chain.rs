//! Ordered fallback across several resolvers
//!
//! A deployment usually has a primary store (e.g. an HTTP export) and a
//! fallback (a local mirror directory). [`ResolverChain`] tries each resolver
//! in order and returns the first non-blank file.
//!
//! Outcome when no resolver produced content:
//!
//! - at least one resolver answered `Ok(None)`: `Ok(None)` ("no data")
//! - every resolver failed: the last error, tagged with the name of the
//!   resolver that raised it ([`SourceError::Resolver`])
//!
//! The optional deadline is checked between resolvers. A resolver that is
//! already running is never interrupted here; bound it with
//! [`crate::runtime::fetch_with_timeout`] for a hard limit.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{info, warn};

use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};

use crate::ResolverStats;

/// Resolvers tried in order until one returns content
pub struct ResolverChain {
    resolvers: Vec<Box<dyn SourceResolver>>,
    deadline: Option<Duration>,
    stats: Mutex<ResolverStats>,
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverChain {
    /// Empty chain without a deadline
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
            deadline: None,
            stats: Mutex::new(ResolverStats::default()),
        }
    }

    /// Append a resolver; earlier resolvers take priority
    pub fn with_resolver<R: SourceResolver + 'static>(mut self, resolver: R) -> Self {
        self.push(resolver);
        self
    }

    /// Overall time budget for one fetch across all resolvers
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Append a resolver in place
    pub fn push<R: SourceResolver + 'static>(&mut self, resolver: R) {
        self.resolvers.push(Box::new(resolver));
    }

    /// Number of resolvers
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// True when no resolver is configured
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolver names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Configured overall budget
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> ResolverStats {
        self.lock_stats().clone()
    }

    fn lock_stats(&self) -> MutexGuard<'_, ResolverStats> {
        // Counters stay usable even if a panicking thread held the lock.
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn resolve(&self) -> Result<Option<(usize, CsvSource)>, SourceError> {
        let started = Instant::now();
        let mut saw_empty = false;
        let mut last_error = None;

        for (index, resolver) in self.resolvers.iter().enumerate() {
            if let Some(deadline) = self.deadline {
                if started.elapsed() >= deadline {
                    warn!(
                        "deadline of {}ms reached before trying '{}'",
                        deadline.as_millis(),
                        resolver.name()
                    );
                    return Err(SourceError::Timeout {
                        after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    });
                }
            }

            match resolver.fetch_raw_csv() {
                Ok(Some(source)) if !source.is_blank() => return Ok(Some((index, source))),
                Ok(_) => {
                    info!("resolver '{}' has no data", resolver.name());
                    saw_empty = true;
                }
                Err(err) => {
                    warn!("resolver '{}' failed: {}", resolver.name(), err);
                    last_error = Some(err.in_resolver(resolver.name()));
                }
            }
        }

        match last_error {
            Some(err) if !saw_empty => Err(err),
            _ => Ok(None),
        }
    }
}

impl SourceResolver for ResolverChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        let result = self.resolve();

        let mut stats = self.lock_stats();
        stats.fetches += 1;
        match result {
            Ok(Some((index, source))) => {
                let name = self.resolvers[index].name();
                info!("resolver '{}' supplied {}", name, source.filename);
                stats.hits += 1;
                stats.bytes_fetched += source.content.len() as u64;
                stats.last_resolver = Some(name.to_string());
                Ok(Some(source))
            }
            Ok(None) => {
                stats.misses += 1;
                Ok(None)
            }
            Err(err) => {
                stats.failures += 1;
                if let SourceError::Resolver { name, .. } = &err {
                    stats.last_resolver = Some(name.clone());
                }
                stats.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InlineSource;

    struct Failing;

    impl SourceResolver for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
            Err(SourceError::Transport("connection refused".into()))
        }
    }

    #[test]
    fn first_with_content_wins() {
        let chain = ResolverChain::new()
            .with_resolver(InlineSource::empty())
            .with_resolver(InlineSource::new("a.csv", "Device\n"))
            .with_resolver(InlineSource::new("b.csv", "Device\n"));

        let source = chain.fetch_raw_csv().unwrap().unwrap();
        assert_eq!(source.filename, "a.csv");

        let stats = chain.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.last_resolver.as_deref(), Some("inline"));
    }

    #[test]
    fn errors_fall_through() {
        let chain = ResolverChain::new()
            .with_resolver(Failing)
            .with_resolver(InlineSource::new("b.csv", "Device\n"));
        assert_eq!(chain.fetch_raw_csv().unwrap().unwrap().filename, "b.csv");
    }

    #[test]
    fn blank_content_is_skipped() {
        let chain = ResolverChain::new()
            .with_resolver(InlineSource::new("blank.csv", " \n"))
            .with_resolver(InlineSource::new("b.csv", "Device\n"));
        assert_eq!(chain.fetch_raw_csv().unwrap().unwrap().filename, "b.csv");
    }

    #[test]
    fn empty_beats_error() {
        let chain = ResolverChain::new()
            .with_resolver(Failing)
            .with_resolver(InlineSource::empty());
        assert!(chain.fetch_raw_csv().unwrap().is_none());
        assert_eq!(chain.stats().misses, 1);
    }

    #[test]
    fn all_failing_returns_last_error() {
        let chain = ResolverChain::new().with_resolver(Failing);
        let err = chain.fetch_raw_csv().unwrap_err();
        assert!(matches!(err.root(), SourceError::Transport(_)));
        assert!(err.is_retryable());

        let stats = chain.stats();
        assert_eq!(stats.failures, 1);
        assert!(stats.last_error.unwrap().contains("connection refused"));
    }

    #[test]
    fn failure_names_the_failing_resolver() {
        let chain = ResolverChain::new()
            .with_resolver(InlineSource::empty().named("primary"))
            .with_resolver(Failing);
        assert!(chain.fetch_raw_csv().unwrap().is_none());

        let chain = ResolverChain::new()
            .with_resolver(Failing)
            .with_resolver(Failing);
        match chain.fetch_raw_csv() {
            Err(SourceError::Resolver { name, source }) => {
                assert_eq!(name, "failing");
                assert!(matches!(*source, SourceError::Transport(_)));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let stats = chain.stats();
        assert_eq!(stats.last_resolver.as_deref(), Some("failing"));
        assert_eq!(
            stats.last_error.as_deref(),
            Some("failing: Transport error: connection refused")
        );
    }

    #[test]
    fn empty_chain_has_no_data() {
        let chain = ResolverChain::default();
        assert!(chain.is_empty());
        assert!(chain.fetch_raw_csv().unwrap().is_none());
    }

    #[test]
    fn zero_deadline_times_out() {
        let chain = ResolverChain::new()
            .with_resolver(InlineSource::new("a.csv", "Device\n"))
            .with_deadline(Duration::ZERO);
        assert!(matches!(
            chain.fetch_raw_csv(),
            Err(SourceError::Timeout { after_ms: 0 })
        ));
    }
}
