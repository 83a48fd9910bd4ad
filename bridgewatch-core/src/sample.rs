//! Parsed sensor samples
//!
//! A [`SensorSample`] is created once per data row on every parse and never
//! mutated afterwards. Collections of samples are filtered and sorted into new
//! collections by [`crate::window`].
//!
//! The numeric payload depends on which header vocabulary the file used:
//!
//! ```text
//! Device,Timestamp,X,Y,Z,Stroke_mm,Temperature_C   -> Readings::Device
//! created_at,entry_id,field1,field2,field3,field4  -> Readings::Generic
//! ```

use serde::{Deserialize, Serialize};

use crate::csv::CsvVocabulary;
use crate::time::Timestamp;

/// One parsed sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Epoch milliseconds; always a valid integer
    pub timestamp: Timestamp,
    /// Device column, device vocabulary only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Passthrough row identifier (`id` or `entry_id` column)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Passthrough `created_at` text, unmodified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Numeric values
    #[serde(flatten)]
    pub readings: Readings,
}

impl SensorSample {
    /// Vocabulary the sample was parsed with
    pub fn vocabulary(&self) -> CsvVocabulary {
        self.readings.vocabulary()
    }

    /// Look up a numeric field by its canonical name
    pub fn value(&self, field: &str) -> Option<f64> {
        self.readings.value(field)
    }
}

/// Numeric payload of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Readings {
    /// Accelerometer/strain device files
    Device(DeviceReadings),
    /// Generic (ThingSpeak-style) channel exports
    Generic(GenericReadings),
}

impl Readings {
    /// Vocabulary these readings came from
    pub fn vocabulary(&self) -> CsvVocabulary {
        match self {
            Self::Device(_) => CsvVocabulary::Device,
            Self::Generic(_) => CsvVocabulary::Generic,
        }
    }

    /// Numeric value by canonical field name
    pub fn value(&self, field: &str) -> Option<f64> {
        match self {
            Self::Device(r) => match field {
                "x" => Some(r.x),
                "y" => Some(r.y),
                "z" => Some(r.z),
                "stroke_mm" => Some(r.stroke_mm),
                "temperature_c" => Some(r.temperature_c),
                _ => None,
            },
            Self::Generic(r) => match field {
                "vibration" => Some(r.vibration),
                "acceleration" => Some(r.acceleration),
                "strain" => Some(r.strain),
                "temperature" => Some(r.temperature),
                _ => None,
            },
        }
    }
}

/// Readings from a device-format file
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceReadings {
    /// X axis acceleration
    pub x: f64,
    /// Y axis acceleration
    pub y: f64,
    /// Z axis acceleration
    pub z: f64,
    /// Bearing stroke in millimetres
    pub stroke_mm: f64,
    /// Temperature in degrees Celsius
    pub temperature_c: f64,
}

/// Readings from a generic-format file
///
/// `field1..field4` map to vibration, acceleration, strain and temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericReadings {
    /// field1
    pub vibration: f64,
    /// field2
    pub acceleration: f64,
    /// field3
    pub strain: f64,
    /// field4
    pub temperature: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_sample() -> SensorSample {
        SensorSample {
            timestamp: 1_705_314_600_000,
            device: Some("D1".into()),
            id: None,
            created_at: None,
            readings: Readings::Device(DeviceReadings {
                x: 0.5,
                y: -0.25,
                z: 9.81,
                stroke_mm: 1.2,
                temperature_c: 21.0,
            }),
        }
    }

    #[test]
    fn serializes_flat() {
        let json = serde_json::to_value(device_sample()).unwrap();
        assert_eq!(json["timestamp"], 1_705_314_600_000i64);
        assert_eq!(json["device"], "D1");
        assert_eq!(json["z"], 9.81);
        assert!(json.get("id").is_none());
        assert!(json.get("readings").is_none());
    }

    #[test]
    fn generic_sample_deserializes_into_generic_readings() {
        let json = r#"{"timestamp":5,"vibration":1.0,"acceleration":2.0,"strain":3.0,"temperature":4.0}"#;
        let sample: SensorSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.vocabulary(), CsvVocabulary::Generic);
        assert_eq!(sample.value("strain"), Some(3.0));
        assert_eq!(sample.value("x"), None);
    }

    #[test]
    fn value_lookup() {
        let sample = device_sample();
        assert_eq!(sample.value("stroke_mm"), Some(1.2));
        assert_eq!(sample.value("vibration"), None);
    }
}
