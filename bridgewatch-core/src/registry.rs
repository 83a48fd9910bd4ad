//! In-memory device registry
//!
//! Process-local [`DeviceStore`] used by tests and single-instance
//! deployments. Records live in a `BTreeMap` so listing is ordered by id.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::time::{to_datetime, SystemClock, TimeSource};
use crate::traits::store::{DeviceInput, DeviceRecord, DeviceStore, StoreError};

/// `DeviceStore` backed by a locked map
#[derive(Debug, Default)]
pub struct MemoryDeviceStore<C = SystemClock> {
    devices: RwLock<BTreeMap<String, DeviceRecord>>,
    clock: C,
}

impl MemoryDeviceStore<SystemClock> {
    /// Empty store on the system clock
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: TimeSource> MemoryDeviceStore<C> {
    /// Empty store stamping records from `clock`
    pub fn with_clock(clock: C) -> Self {
        Self {
            devices: RwLock::new(BTreeMap::new()),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        to_datetime(self.clock.now()).unwrap_or_else(Utc::now)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, DeviceRecord>>, StoreError> {
        self.devices
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, DeviceRecord>>, StoreError> {
        self.devices
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

fn check(id: &str, input: &DeviceInput) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidInput("id must not be empty"));
    }
    if id.contains(',') {
        return Err(StoreError::InvalidInput("id must not contain commas"));
    }
    if input.name.trim().is_empty() {
        return Err(StoreError::InvalidInput("name must not be empty"));
    }
    Ok(())
}

impl<C: TimeSource> DeviceStore for MemoryDeviceStore<C> {
    fn list(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Option<DeviceRecord>, StoreError> {
        Ok(self.read()?.get(id).cloned())
    }

    fn create(&self, id: &str, input: DeviceInput) -> Result<DeviceRecord, StoreError> {
        check(id, &input)?;
        let now = self.now();
        let mut devices = self.write()?;
        if devices.contains_key(id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }

        let record = DeviceRecord {
            id: id.to_string(),
            name: input.name,
            location: input.location,
            active: input.active,
            created_at: now,
            updated_at: now,
        };
        devices.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, id: &str, input: DeviceInput) -> Result<DeviceRecord, StoreError> {
        check(id, &input)?;
        let now = self.now();
        let mut devices = self.write()?;
        let record = devices
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        record.name = input.name;
        record.location = input.location;
        record.active = input.active;
        record.updated_at = now;
        Ok(record.clone())
    }

    fn remove(&self, id: &str) -> Result<DeviceRecord, StoreError> {
        self.write()?
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
