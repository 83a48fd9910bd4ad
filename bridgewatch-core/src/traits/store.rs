//! Device registry repository
//!
//! Devices appear in CSV files under the `Device` column. The registry holds
//! the operator-maintained metadata for those identifiers. It is injected as a
//! trait object so a database-backed store can replace the in-memory one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registered sensor device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Identifier as it appears in the CSV `Device` column
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Mounting location on the structure
    pub location: Option<String>,
    /// Inactive devices stay registered but are hidden from dashboards
    pub active: bool,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Time of the last update
    pub updated_at: DateTime<Utc>,
}

/// Fields a caller may set when creating or updating a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInput {
    /// Human readable name
    pub name: String,
    /// Mounting location
    #[serde(default)]
    pub location: Option<String>,
    /// Defaults to true
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl DeviceInput {
    /// Active device without a location
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            active: true,
        }
    }

    /// Set the mounting location
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the active flag
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Registry failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Id is already registered
    #[error("Device '{0}' already exists")]
    Duplicate(String),

    /// No device with that id
    #[error("Device '{0}' not found")]
    NotFound(String),

    /// Input failed validation
    #[error("Invalid device: {0}")]
    InvalidInput(&'static str),

    /// Backing storage is unusable (e.g. a poisoned lock)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// CRUD repository for devices
pub trait DeviceStore: Send + Sync {
    /// All devices ordered by id
    fn list(&self) -> Result<Vec<DeviceRecord>, StoreError>;

    /// Device by id
    fn get(&self, id: &str) -> Result<Option<DeviceRecord>, StoreError>;

    /// Register a new device; fails if the id is taken
    fn create(&self, id: &str, input: DeviceInput) -> Result<DeviceRecord, StoreError>;

    /// Replace the mutable fields of an existing device
    fn update(&self, id: &str, input: DeviceInput) -> Result<DeviceRecord, StoreError>;

    /// Remove a device, returning the removed record
    fn remove(&self, id: &str) -> Result<DeviceRecord, StoreError>;
}
