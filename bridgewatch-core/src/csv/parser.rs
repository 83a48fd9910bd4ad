//! CSV text to sensor samples
//!
//! ## Algorithm
//!
//! 1. Split on line breaks (`\n` or `\r\n`), dropping blank lines. Fewer than
//!    two remaining lines means "no data", not an error.
//! 2. Build a [`ColumnMapping`] from the header line. A header matching
//!    neither vocabulary yields no samples.
//! 3. For every data row: split on commas, check the field count against the
//!    header, coerce numeric columns with a tolerant parser (bad text becomes
//!    NaN), resolve the timestamp.
//! 4. Rows where every numeric column is NaN carry no signal and are dropped.
//!    Surviving NaNs are normalized to `0.0`.
//!
//! Malformed rows are logged and skipped; one bad row never aborts the file.
//! Output keeps file order; sorting is the window selector's job.
//!
//! ## Example
//!
//! ```rust
//! use bridgewatch_core::csv::{CsvParser, ParserConfig};
//! use bridgewatch_core::time::FixedClock;
//!
//! let text = "Device,Timestamp,X,Y,Z,Stroke_mm,Temperature_C\n\
//!             D1,10:29:30,0.01,-0.02,9.81,1.5,21.4\n";
//!
//! let parser = CsvParser::new(ParserConfig::default());
//! let outcome = parser.parse(text, &FixedClock::new(1_705_314_600_000));
//!
//! assert_eq!(outcome.samples.len(), 1);
//! assert_eq!(outcome.samples[0].timestamp, 1_705_314_570_000);
//! ```

use chrono::{FixedOffset, Offset, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::RowError;
use crate::sample::{DeviceReadings, GenericReadings, Readings, SensorSample};
use crate::time::{SystemClock, Timestamp, TimeSource};

use super::timestamp::{BareTimePolicy, TimestampOrigin, TimestampResolver};
use super::vocabulary::{ColumnMapping, CsvVocabulary, NUMERIC_SLOTS};

/// Maximum number of fields in a single row
pub const MAX_FIELDS: usize = 32;

/// Field delimiter
pub const DELIMITER: char = ',';

/// Fields of one CSV line
pub type RawRow<'a> = heapless::Vec<&'a str, MAX_FIELDS>;

/// Parser settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// How bare `HH:MM:SS` timestamps are anchored to a date
    pub bare_time_policy: BareTimePolicy,
    /// Offset for naive datetimes and bare times, in minutes east of UTC
    pub utc_offset_minutes: i32,
}

impl ParserConfig {
    /// How bare times of day are dated
    pub fn with_bare_time_policy(mut self, policy: BareTimePolicy) -> Self {
        self.bare_time_policy = policy;
        self
    }

    /// Offset applied to naive timestamps
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Offset as a chrono value; out-of-range offsets fall back to UTC
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Counters collected while parsing one file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Non-blank data lines seen (header excluded)
    pub data_lines: usize,
    /// Samples emitted
    pub samples: usize,
    /// Rows skipped for structural problems
    pub malformed_rows: usize,
    /// Rows skipped because no numeric column parsed
    pub signalless_rows: usize,
    /// Rows whose timestamp came from a bare time of day
    pub bare_time_rows: usize,
    /// Rows stamped with the parse time
    pub timestamp_fallbacks: usize,
}

impl ParseStats {
    /// Rows that did not produce a sample
    pub fn skipped(&self) -> usize {
        self.malformed_rows + self.signalless_rows
    }
}

/// Result of parsing one file
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Samples in file order
    pub samples: Vec<SensorSample>,
    /// Detected header vocabulary, if any
    pub vocabulary: Option<CsvVocabulary>,
    /// Why the header line could not be split, if it could not
    pub header_error: Option<RowError>,
    /// Row counters
    pub stats: ParseStats,
}

/// CSV parser for both header vocabularies
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    config: ParserConfig,
}

impl CsvParser {
    /// Parser with the given options
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Active options
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse CSV text, reading "now" from `clock` once
    pub fn parse<C: TimeSource + ?Sized>(&self, text: &str, clock: &C) -> ParseOutcome {
        self.parse_at(text, clock.now())
    }

    /// Parse CSV text against a fixed parse time
    pub fn parse_at(&self, text: &str, now: Timestamp) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let header = match lines.next() {
            Some((_, line)) => line,
            None => return outcome,
        };

        let columns = match split_row(header) {
            Ok(columns) => columns,
            Err(err) => {
                warn!("CSV header rejected: {}", err);
                outcome.header_error = Some(err);
                return outcome;
            }
        };
        let mapping = match ColumnMapping::from_header(columns.as_slice()) {
            Some(mapping) => mapping,
            None => {
                warn!("CSV header matches no known vocabulary: {:?}", header.trim());
                return outcome;
            }
        };
        outcome.vocabulary = Some(mapping.vocabulary());

        let resolver = TimestampResolver::new(now, self.config.offset(), self.config.bare_time_policy);

        for (index, line) in lines {
            outcome.stats.data_lines += 1;

            match parse_row(line, &mapping, &resolver) {
                Ok((sample, origin)) => {
                    match origin {
                        TimestampOrigin::BareTime => outcome.stats.bare_time_rows += 1,
                        TimestampOrigin::ParseTime => outcome.stats.timestamp_fallbacks += 1,
                        TimestampOrigin::DateTime => {}
                    }
                    outcome.samples.push(sample);
                }
                Err(RowError::NoNumericSignal) => {
                    debug!("line {}: skipped, {}", index + 1, RowError::NoNumericSignal);
                    outcome.stats.signalless_rows += 1;
                }
                Err(err) => {
                    debug!("line {}: malformed row skipped, {}", index + 1, err);
                    outcome.stats.malformed_rows += 1;
                }
            }
        }

        outcome.stats.samples = outcome.samples.len();
        if outcome.stats.skipped() > 0 {
            warn!(
                "CSV parse skipped {} of {} rows ({} malformed, {} without numeric values)",
                outcome.stats.skipped(),
                outcome.stats.data_lines,
                outcome.stats.malformed_rows,
                outcome.stats.signalless_rows,
            );
        }

        outcome
    }
}

/// Parse CSV text with default settings and the system clock
///
/// Equivalent to `CsvParser::default().parse(text, &SystemClock).samples`.
pub fn parse_csv(text: &str) -> Vec<SensorSample> {
    CsvParser::default().parse(text, &SystemClock).samples
}

/// Split one line into trimmed, unquoted fields
pub fn split_row(line: &str) -> Result<RawRow<'_>, RowError> {
    let mut fields = RawRow::new();
    for field in line.split(DELIMITER) {
        fields
            .push(field.trim().trim_matches('"'))
            .map_err(|_| RowError::TooManyFields { max: MAX_FIELDS })?;
    }
    Ok(fields)
}

/// Tolerant float parsing; anything unusable becomes NaN
pub fn parse_number(field: &str) -> f64 {
    match field.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => f64::NAN,
    }
}

fn parse_row(
    line: &str,
    mapping: &ColumnMapping,
    resolver: &TimestampResolver,
) -> Result<(SensorSample, TimestampOrigin), RowError> {
    let fields = split_row(line)?;
    if fields.len() != mapping.width() {
        return Err(RowError::ColumnCount {
            expected: mapping.width(),
            found: fields.len(),
        });
    }

    let mut values = [f64::NAN; NUMERIC_SLOTS];
    for (value, column) in values.iter_mut().zip(mapping.numeric()) {
        if let Some(index) = column {
            *value = parse_number(fields[*index]);
        }
    }

    let width = mapping.vocabulary().numeric_fields().len();
    if values[..width].iter().all(|v| v.is_nan()) {
        return Err(RowError::NoNumericSignal);
    }
    let values = values.map(|v| if v.is_nan() { 0.0 } else { v });

    let readings = match mapping.vocabulary() {
        CsvVocabulary::Device => Readings::Device(DeviceReadings {
            x: values[0],
            y: values[1],
            z: values[2],
            stroke_mm: values[3],
            temperature_c: values[4],
        }),
        CsvVocabulary::Generic => Readings::Generic(GenericReadings {
            vibration: values[0],
            acceleration: values[1],
            strain: values[2],
            temperature: values[3],
        }),
    };

    let text_at = |column: Option<usize>| {
        column
            .map(|index| fields[index])
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };

    let (timestamp, origin) = resolver.resolve(mapping.timestamp_candidates().map(|index| fields[index]));

    Ok((
        SensorSample {
            timestamp,
            device: text_at(mapping.device()),
            id: text_at(mapping.id()),
            created_at: text_at(mapping.created_at()),
            readings,
        },
        origin,
    ))
}
