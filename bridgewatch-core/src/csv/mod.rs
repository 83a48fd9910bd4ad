//! Sensor CSV parsing
//!
//! - [`vocabulary`] - header vocabularies and the column mapping
//! - [`timestamp`] - datetime / bare time resolution
//! - [`parser`] - row splitting, numeric coercion, sample construction

pub mod parser;
pub mod timestamp;
pub mod vocabulary;

pub use parser::{
    parse_csv, parse_number, split_row, CsvParser, ParseOutcome, ParseStats, ParserConfig, RawRow,
    MAX_FIELDS,
};
pub use timestamp::{BareTimePolicy, TimestampOrigin, TimestampResolver};
pub use vocabulary::{ColumnMapping, CsvVocabulary};
