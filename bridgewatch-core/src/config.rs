//! Pipeline configuration
//!
//! Loaded from JSON; every field is optional and falls back to its default.
//!
//! ```json
//! {
//!   "parser": { "bare_time_policy": "roll_back_if_future", "utc_offset_minutes": 60 },
//!   "window": { "default_minutes": 1, "max_minutes": 10 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::csv::ParserConfig;
use crate::errors::ConfigError;
use crate::window::WindowConfig;

/// Largest accepted UTC offset magnitude, in minutes
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Settings for [`crate::pipeline::IngestPipeline`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// CSV parsing options
    pub parser: ParserConfig,
    /// Recency window bounds
    pub window: WindowConfig,
}

impl IngestConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "parser.utc_offset_minutes",
                reason: "must be within +/- 18 hours",
            });
        }
        self.window.validate()
    }
}
