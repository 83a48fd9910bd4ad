//! Header vocabularies and column mapping
//!
//! Two header conventions are accepted, detected once from the header row:
//!
//! | Vocabulary | Header | Numeric columns |
//! |---|---|---|
//! | `Device` | `Device,Timestamp,X,Y,Z,Stroke_mm,Temperature_C` | x, y, z, stroke_mm, temperature_c |
//! | `Generic` | `created_at,entry_id,field1,field2,field3,field4` | vibration/field1, acceleration/field2, strain/field3, temperature/field4 |
//!
//! Header names are compared after trimming whitespace and surrounding quotes
//! and lower-casing. Unknown headers are ignored. When a header carries
//! columns from both vocabularies, `Device` wins.

use serde::{Deserialize, Serialize};

/// Number of numeric slots in the widest vocabulary
pub const NUMERIC_SLOTS: usize = 5;

/// Canonical numeric field names of the device vocabulary, in slot order
pub const DEVICE_FIELDS: [&str; 5] = ["x", "y", "z", "stroke_mm", "temperature_c"];

/// Canonical numeric field names of the generic vocabulary, in slot order
pub const GENERIC_FIELDS: [&str; 4] = ["vibration", "acceleration", "strain", "temperature"];

// Aliases per slot, most specific first.
const DEVICE_ALIASES: [&[&str]; 5] = [&["x"], &["y"], &["z"], &["stroke_mm"], &["temperature_c"]];

const GENERIC_ALIASES: [&[&str]; 4] = [
    &["vibration", "field1"],
    &["acceleration", "field2"],
    &["strain", "field3"],
    &["temperature", "field4"],
];

const DEVICE_COLUMN: &[&str] = &["device"];
const TIMESTAMP_COLUMN: &[&str] = &["timestamp"];
const CREATED_AT_COLUMN: &[&str] = &["created_at"];
const ID_COLUMN: &[&str] = &["id", "entry_id"];

/// Header naming convention of a CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvVocabulary {
    /// `Device,Timestamp,X,Y,Z,Stroke_mm,Temperature_C`
    Device,
    /// `created_at,entry_id,field1,field2,field3,field4`
    Generic,
}

impl CsvVocabulary {
    /// Detect the vocabulary from normalized header names
    pub fn detect<S: AsRef<str>>(header: &[S]) -> Option<Self> {
        if has_any(header, &DEVICE_ALIASES) {
            Some(Self::Device)
        } else if has_any(header, &GENERIC_ALIASES) {
            Some(Self::Generic)
        } else {
            None
        }
    }

    /// Canonical numeric field names in slot order
    pub fn numeric_fields(self) -> &'static [&'static str] {
        match self {
            Self::Device => &DEVICE_FIELDS,
            Self::Generic => &GENERIC_FIELDS,
        }
    }

    fn aliases(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::Device => &DEVICE_ALIASES,
            Self::Generic => &GENERIC_ALIASES,
        }
    }
}

/// Normalize one header token
pub fn normalize_header(token: &str) -> String {
    token.trim().trim_matches('"').trim().to_lowercase()
}

fn find_column<S: AsRef<str>>(header: &[S], names: &[&str]) -> Option<usize> {
    // Alias order is precedence order.
    names
        .iter()
        .find_map(|name| header.iter().position(|h| h.as_ref() == *name))
}

fn has_any<S: AsRef<str>>(header: &[S], aliases: &[&[&str]]) -> bool {
    aliases
        .iter()
        .any(|names| find_column(header, names).is_some())
}

/// Canonical field name to column index, built once per parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    vocabulary: CsvVocabulary,
    width: usize,
    device: Option<usize>,
    timestamp: Option<usize>,
    created_at: Option<usize>,
    id: Option<usize>,
    numeric: [Option<usize>; NUMERIC_SLOTS],
}

impl ColumnMapping {
    /// Build a mapping from raw header tokens
    ///
    /// Returns `None` when the header matches neither vocabulary.
    pub fn from_header<S: AsRef<str>>(raw_header: &[S]) -> Option<Self> {
        let header: Vec<String> = raw_header
            .iter()
            .map(|token| normalize_header(token.as_ref()))
            .collect();

        let vocabulary = CsvVocabulary::detect(&header)?;

        let mut numeric = [None; NUMERIC_SLOTS];
        for (slot, names) in numeric.iter_mut().zip(vocabulary.aliases()) {
            *slot = find_column(&header, names);
        }

        Some(Self {
            vocabulary,
            width: header.len(),
            device: find_column(&header, DEVICE_COLUMN),
            timestamp: find_column(&header, TIMESTAMP_COLUMN),
            created_at: find_column(&header, CREATED_AT_COLUMN),
            id: find_column(&header, ID_COLUMN),
            numeric,
        })
    }

    /// Vocabulary the header was recognized as
    pub fn vocabulary(&self) -> CsvVocabulary {
        self.vocabulary
    }

    /// Number of header columns; data rows must match it
    pub fn width(&self) -> usize {
        self.width
    }

    /// Index of the device column
    pub fn device(&self) -> Option<usize> {
        self.device
    }

    /// Index of the entry id column
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    /// Index of the created_at column
    pub fn created_at(&self) -> Option<usize> {
        self.created_at
    }

    /// Timestamp candidate columns in precedence order
    pub fn timestamp_candidates(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        [self.timestamp, self.created_at].into_iter().flatten()
    }

    /// Column index per numeric slot of the detected vocabulary
    pub fn numeric(&self) -> &[Option<usize>] {
        &self.numeric[..self.vocabulary.numeric_fields().len()]
    }
}
