//! Declarative resolver setup
//!
//! ```json
//! {
//!   "deadline_ms": 8000,
//!   "sources": [
//!     { "kind": "http", "url": "https://files.example.com/bridge/latest.csv",
//!       "bearer_token": "…", "timeout_ms": 5000 },
//!     { "kind": "directory", "path": "/var/lib/bridgewatch/mirror" }
//!   ]
//! }
//! ```
//!
//! Order in `sources` is priority order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bridgewatch_core::traits::{SourceError, SourceResolver};

use crate::chain::ResolverChain;
use crate::directory::DirectorySource;
use crate::memory::InlineSource;

/// One resolver entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Newest file in a local directory
    Directory {
        /// Directory to scan
        path: PathBuf,
        /// File extension to accept; defaults to `csv`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extension: Option<String>,
    },
    /// Download from a URL
    Http {
        /// Endpoint returning the CSV text
        url: String,
        /// Per-request timeout
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
        /// Sent as `Authorization: Bearer`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_token: Option<String>,
        /// Sent as `Authorization: Basic`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        basic_auth: Option<BasicAuth>,
        /// Retries after a retryable failure
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_retries: Option<u32>,
        /// Extra request headers
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
    /// Fixed document, for demos and smoke tests
    Inline {
        /// Name reported for the document
        filename: String,
        /// CSV text
        content: String,
    },
}

/// HTTP basic credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

/// Full resolver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Resolvers in priority order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Budget across the whole chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl SourcesConfig {
    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        serde_json::from_str(json).map_err(|e| SourceError::Config(e.to_string()))
    }

    /// Read and parse a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Instantiate every resolver in order
    pub fn build(&self) -> Result<ResolverChain, SourceError> {
        if self.sources.is_empty() {
            return Err(SourceError::Config("at least one source is required".into()));
        }

        let mut chain = ResolverChain::new();
        if let Some(ms) = self.deadline_ms {
            chain = chain.with_deadline(Duration::from_millis(ms));
        }

        for source in &self.sources {
            match source {
                SourceConfig::Directory { path, extension } => {
                    let mut resolver = DirectorySource::new(path.clone());
                    if let Some(extension) = extension {
                        resolver = resolver.with_extension(extension.clone());
                    }
                    chain.push(resolver);
                }
                SourceConfig::Http { .. } => chain.push(build_http(source)?),
                SourceConfig::Inline { filename, content } => {
                    chain.push(InlineSource::new(filename.clone(), content.clone()));
                }
            }
        }

        Ok(chain)
    }
}

#[cfg(feature = "http")]
fn build_http(source: &SourceConfig) -> Result<Box<dyn SourceResolver>, SourceError> {
    use crate::http::{HttpConfig, HttpSource};

    let SourceConfig::Http {
        url,
        timeout_ms,
        bearer_token,
        basic_auth,
        max_retries,
        headers,
    } = source
    else {
        return Err(SourceError::Config("not an http source".into()));
    };

    let mut config = HttpConfig::new(url.clone());
    if let Some(ms) = timeout_ms {
        config = config.timeout_ms(*ms);
    }
    if let Some(retries) = max_retries {
        config = config.max_retries(*retries);
    }
    match (bearer_token, basic_auth) {
        (Some(_), Some(_)) => {
            return Err(SourceError::Config(
                "bearer_token and basic_auth are mutually exclusive".into(),
            ))
        }
        (Some(token), None) => config = config.bearer_token(token.clone()),
        (None, Some(auth)) => {
            config = config.basic_auth(auth.username.clone(), auth.password.clone())
        }
        (None, None) => {}
    }
    for (name, value) in headers {
        config = config.header(name.clone(), value.clone());
    }

    Ok(Box::new(HttpSource::new(config)?))
}

#[cfg(not(feature = "http"))]
fn build_http(_source: &SourceConfig) -> Result<Box<dyn SourceResolver>, SourceError> {
    Err(SourceError::Config(
        "http sources require the `http` feature".into(),
    ))
}
