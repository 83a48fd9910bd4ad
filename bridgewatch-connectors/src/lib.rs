//! CSV source resolvers for BridgeWatch
//!
//! ## Overview
//!
//! The core pipeline only knows the [`SourceResolver`] trait: "return the
//! newest CSV file, or nothing". This crate provides the resolvers a
//! deployment plugs in, plus the plumbing to combine and bound them.
//!
//! ## Resolver Selection Guide
//!
//! ### Directory ([`DirectorySource`])
//!
//! **When to use:**
//! - A sync job mirrors the file store onto local disk
//! - Development with a folder of sample exports
//!
//! Picks the file with the newest modification time.
//!
//! ### HTTP/HTTPS ([`http::HttpSource`], feature `http`)
//!
//! **When to use:**
//! - Exports served from a bucket, file-sharing link or channel feed
//! - Authentication by bearer token, basic auth or API key header
//!
//! Retries `5xx`, `429` and transport errors with exponential backoff. A
//! `404` is reported as "no data".
//!
//! ### Inline ([`InlineSource`])
//!
//! Fixed document held in memory. Fixtures, demos and smoke tests.
//!
//! ## Combining Resolvers
//!
//! [`ResolverChain`] tries resolvers in priority order and keeps
//! [`ResolverStats`]. [`SourcesConfig`] builds a chain from JSON.
//!
//! ## Async Services
//!
//! Resolvers block. [`runtime`] (feature `runtime`) moves them onto tokio's
//! blocking pool under a timeout.
//!
//! ## Example Usage
//!
//! ```rust
//! use bridgewatch_connectors::{InlineSource, ResolverChain};
//! use bridgewatch_core::traits::SourceResolver;
//!
//! let chain = ResolverChain::new()
//!     .with_resolver(InlineSource::empty().named("primary"))
//!     .with_resolver(InlineSource::new("fallback.csv", "Device,Timestamp,X,Y,Z\n"));
//!
//! let source = chain.fetch_raw_csv()?.expect("fallback has data");
//! assert_eq!(source.filename, "fallback.csv");
//! assert_eq!(chain.stats().hits, 1);
//! # Ok::<(), bridgewatch_core::traits::SourceError>(())
//! ```

#![deny(unsafe_code)]

pub mod chain;
pub mod config;
pub mod directory;
pub mod memory;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "runtime")]
pub mod runtime;

// Re-export common types
pub use chain::ResolverChain;
pub use config::{SourceConfig, SourcesConfig};
pub use directory::DirectorySource;
pub use memory::InlineSource;

#[cfg(feature = "http")]
pub use http::{AuthMethod, HttpConfig, HttpSource};

pub use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};

use serde::Serialize;

/// Fetch statistics kept by a [`ResolverChain`]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    /// Total fetches attempted
    pub fetches: u64,
    /// Fetches that returned a file
    pub hits: u64,
    /// Fetches where every resolver had nothing
    pub misses: u64,
    /// Fetches that ended in an error
    pub failures: u64,
    /// Bytes of CSV handed to the pipeline
    pub bytes_fetched: u64,
    /// Resolver that supplied the last file
    pub last_resolver: Option<String>,
    /// Last error message
    pub last_error: Option<String>,
}
