//! HTTP/HTTPS source - download the current CSV export from a URL
//!
//! ## Overview
//!
//! Covers exported-file endpoints: a storage bucket object, a file-sharing
//! "direct download" link, or a channel export such as
//! `https://api.thingspeak.com/channels/<id>/feeds.csv`.
//!
//! ## Behaviour
//!
//! - `200` with a body: the body is the CSV document
//! - `404`: the file does not exist (yet); reported as "no data"
//! - `5xx` / `429` / transport errors: retried with exponential backoff
//! - other statuses: failure, not retried
//!
//! The file name is taken from `Content-Disposition` when present, else from
//! the last URL path segment.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bridgewatch_connectors::http::{HttpConfig, HttpSource};
//! use bridgewatch_core::traits::SourceResolver;
//!
//! let config = HttpConfig::new("https://files.example.com/bridge/latest.csv")
//!     .bearer_token("token")
//!     .timeout_ms(5_000)
//!     .max_retries(2);
//!
//! let source = HttpSource::new(config)?;
//! if let Some(csv) = source.fetch_raw_csv()? {
//!     println!("{} bytes from {}", csv.content.len(), csv.filename);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};

use bridgewatch_core::traits::{CsvSource, SourceError, SourceResolver};

/// Fallback file name when neither header nor URL provide one
const DEFAULT_FILENAME: &str = "download.csv";

/// HTTP source configuration
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Full URL of the CSV document
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Custom headers
    pub headers: BTreeMap<String, String>,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay; doubles on each retry
    pub backoff_base: Duration,
    /// User agent string
    pub user_agent: String,
}

/// Authentication methods
#[derive(Clone, Debug)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// Basic authentication
    Basic { username: String, password: String },
    /// API key in a header
    ApiKey { header: String, value: String },
}

impl HttpConfig {
    /// Create new configuration for a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            auth: AuthMethod::None,
            headers: BTreeMap::new(),
            max_retries: 2,
            backoff_base: Duration::from_millis(100),
            user_agent: format!("BridgeWatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set basic authentication
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Set API key authentication
    pub fn api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    /// Set request timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    /// Retries after a retryable failure
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// First backoff delay; doubles per retry
    pub fn backoff_base_ms(mut self, ms: u64) -> Self {
        self.backoff_base = Duration::from_millis(ms);
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// CSV source backed by a blocking ureq agent
pub struct HttpSource {
    config: HttpConfig,
    agent: ureq::Agent,
}

impl HttpSource {
    /// Create new HTTP source
    pub fn new(config: HttpConfig) -> Result<Self, SourceError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(SourceError::Config(
                "URL must start with http:// or https://".into(),
            ));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self { config, agent })
    }

    /// Active request options
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Build request with authentication and headers
    fn build_request(&self) -> ureq::Request {
        let mut request = self.agent.get(&self.config.url);

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::Basic { username, password } => {
                let credentials = STANDARD.encode(format!("{}:{}", username, password));
                request = request.set("Authorization", &format!("Basic {}", credentials));
            }
            AuthMethod::ApiKey { header, value } => {
                request = request.set(header, value);
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request.set("Accept", "text/csv, text/plain, */*")
    }

    /// Backoff before retry number `attempt` (1-based)
    fn backoff(&self, attempt: u32) -> Duration {
        self.config
            .backoff_base
            .saturating_mul(1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX))
    }

    fn download(&self) -> Result<Option<CsvSource>, SourceError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                thread::sleep(self.backoff(attempt));
            }

            match self.build_request().call() {
                Ok(response) => {
                    let filename = response
                        .header("Content-Disposition")
                        .and_then(filename_from_disposition)
                        .unwrap_or_else(|| filename_from_url(&self.config.url));
                    let content = response
                        .into_string()
                        .map_err(|e| SourceError::Decode(e.to_string()))?;
                    return Ok(Some(CsvSource::new(filename, content)));
                }
                Err(ureq::Error::Status(404, _)) => {
                    debug!("{} returned 404", self.config.url);
                    return Ok(None);
                }
                Err(ureq::Error::Status(status, response)) => {
                    let err = SourceError::Http {
                        status,
                        message: response.into_string().unwrap_or_default(),
                    };
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    warn!("attempt {} for {} failed: {}", attempt + 1, self.config.url, err);
                    last_error = Some(err);
                }
                Err(ureq::Error::Transport(transport)) => {
                    let err = SourceError::Transport(transport.to_string());
                    warn!("attempt {} for {} failed: {}", attempt + 1, self.config.url, err);
                    last_error = Some(err);
                }
            }
        }

        // All retries exhausted
        Err(last_error.unwrap_or_else(|| SourceError::Transport("Unknown error".into())))
    }
}

impl SourceResolver for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_raw_csv(&self) -> Result<Option<CsvSource>, SourceError> {
        self.download()
    }
}

/// Extract `filename` from a `Content-Disposition` header value
pub fn filename_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Last path segment of a URL, ignoring query and fragment
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path
        .split_once("://")
        .map_or(path, |(_, rest)| rest);

    match path.split_once('/') {
        Some((_, tail)) => tail
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
        None => DEFAULT_FILENAME.to_string(),
    }
}
