//! JSON response bodies for the dashboard API
//!
//! Success:
//!
//! ```json
//! { "success": true, "data": [...],
//!   "metadata": { "totalPoints": 120, "recentPoints": 12, "timeframe": "1 minute",
//!                 "lastUpdate": "2024-01-15T10:29:59.000Z", "filename": "bridge.csv" } }
//! ```
//!
//! Failure (HTTP 404 for "no data", 500 otherwise):
//!
//! ```json
//! { "success": false, "error": "source_unavailable", "message": "..." }
//! ```
//!
//! A failed fetch never produces rows.

use serde::Serialize;

use crate::csv::{CsvVocabulary, ParseStats};
use crate::errors::{IngestError, IngestResult};
use crate::pipeline::RecentData;
use crate::sample::SensorSample;
use crate::time::to_rfc3339;

/// Response body, serialized without an enum tag
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    /// HTTP 200 body
    Success(SuccessBody),
    /// Error body
    Failure(FailureBody),
}

/// Body of a successful request
#[derive(Debug, Clone, Serialize)]
pub struct SuccessBody {
    /// Always true
    pub success: bool,
    /// Samples inside the window, newest first
    pub data: Vec<SensorSample>,
    /// Counts and file details
    pub metadata: ResponseMetadata,
}

/// Summary of the file and the window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Samples parsed from the file
    pub total_points: usize,
    /// Samples returned in `data`
    pub recent_points: usize,
    /// Human readable window, e.g. "5 minutes"
    pub timeframe: String,
    /// Newest sample in the file as RFC 3339
    pub last_update: Option<String>,
    /// File the samples came from
    pub filename: String,
    /// Detected header vocabulary
    pub vocabulary: Option<CsvVocabulary>,
    /// Parser counters
    pub parse_stats: ParseStats,
}

/// Body of a failed request
#[derive(Debug, Clone, Serialize)]
pub struct FailureBody {
    /// Always false
    pub success: bool,
    /// Machine readable error kind
    pub error: String,
    /// Human readable description
    pub message: String,
    /// HTTP status, not serialized
    #[serde(skip)]
    pub status: u16,
}

impl ApiResponse {
    /// Body for a pipeline result
    pub fn from_result(result: IngestResult<RecentData>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::failure(&err),
        }
    }

    /// Body for a successful fetch
    pub fn success(data: RecentData) -> Self {
        let metadata = ResponseMetadata {
            total_points: data.total_points,
            recent_points: data.recent_points(),
            timeframe: timeframe(data.minutes),
            last_update: data.last_update.and_then(to_rfc3339),
            filename: data.filename,
            vocabulary: data.vocabulary,
            parse_stats: data.stats,
        };
        Self::Success(SuccessBody {
            success: true,
            data: data.samples,
            metadata,
        })
    }

    /// Body for a failed fetch
    pub fn failure(err: &IngestError) -> Self {
        Self::Failure(FailureBody {
            success: false,
            error: err.kind().to_string(),
            message: err.to_string(),
            status: err.status_code(),
        })
    }

    /// HTTP status to answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success(_) => 200,
            Self::Failure(body) => body.status,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn timeframe(minutes: f64) -> String {
    if minutes == 1.0 {
        "1 minute".to_string()
    } else if minutes.fract() == 0.0 {
        format!("{} minutes", minutes as i64)
    } else {
        format!("{:.1} minutes", minutes)
    }
}
