//! Persistence for validated batches
//!
//! Handlers only see the [`LocationStore`] trait; the concrete store is
//! chosen when the application state is built.

use async_trait::async_trait;
use chrono::Utc;
use geotrack_core::error_builder::database_error;
use geotrack_core::problemdetails::Problem;
use geotrack_entities::{devices, locations};
use geotrack_types::{DeviceInfo, LocationSample};
use sea_orm::sea_query::OnConflict;
use sea_orm::{prelude::*, DatabaseConnection, DbErr, QueryFilter, Set, TransactionTrait};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Rows per `INSERT` statement. Keeps the bind count (11 per row) well below
/// the SQLite and Postgres parameter limits.
pub const INSERT_CHUNK_SIZE: usize = 500;

/// Internal key of a stored device row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceRef(pub i32);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Device {0} was not found after upsert")]
    DeviceNotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for Problem {
    fn from(_error: StoreError) -> Self {
        database_error()
            .message("Failed to store location data")
            .build()
    }
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Create the device on first sight, otherwise refresh its hardware info.
    async fn upsert_device(
        &self,
        device_id: &str,
        device_info: Option<&DeviceInfo>,
    ) -> Result<DeviceRef, StoreError>;

    /// Store every sample or none of them. Returns the number stored.
    async fn insert_locations(
        &self,
        device: DeviceRef,
        samples: &[LocationSample],
    ) -> Result<usize, StoreError>;

    /// Cheap round trip proving the backend is reachable
    async fn probe_liveness(&self) -> Result<(), StoreError>;
}

pub struct SeaOrmLocationStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmLocationStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocationStore for SeaOrmLocationStore {
    async fn upsert_device(
        &self,
        device_id: &str,
        device_info: Option<&DeviceInfo>,
    ) -> Result<DeviceRef, StoreError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let device = devices::ActiveModel {
            device_id: Set(device_id.to_string()),
            model: Set(device_info.map(|info| info.model.clone())),
            os_version: Set(device_info.map(|info| info.os_version.clone())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // A batch without device_info must not wipe what we already know
        let mut on_conflict = OnConflict::column(devices::Column::DeviceId);
        if device_info.is_some() {
            on_conflict.update_columns([
                devices::Column::Model,
                devices::Column::OsVersion,
                devices::Column::UpdatedAt,
            ]);
        } else {
            on_conflict.update_column(devices::Column::UpdatedAt);
        }

        devices::Entity::insert(device)
            .on_conflict(on_conflict)
            .exec_without_returning(&txn)
            .await?;

        let stored = devices::Entity::find()
            .filter(devices::Column::DeviceId.eq(device_id))
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::DeviceNotFound(device_id.to_string()))?;

        txn.commit().await?;

        debug!("Upserted device {} as row {}", device_id, stored.id);
        Ok(DeviceRef(stored.id))
    }

    async fn insert_locations(
        &self,
        device: DeviceRef,
        samples: &[LocationSample],
    ) -> Result<usize, StoreError> {
        if samples.is_empty() {
            return Ok(0);
        }

        let received_at = Utc::now();
        let txn = self.db.begin().await?;

        for chunk in samples.chunks(INSERT_CHUNK_SIZE) {
            let rows = chunk.iter().map(|sample| locations::ActiveModel {
                device_ref: Set(device.0),
                latitude: Set(sample.latitude),
                longitude: Set(sample.longitude),
                accuracy: Set(sample.accuracy),
                altitude: Set(sample.altitude),
                speed: Set(sample.speed),
                heading: Set(sample.heading),
                battery_level: Set(sample.battery_level),
                activity_type: Set(sample.activity_type.map(|a| a.as_str().to_string())),
                timestamp: Set(sample.timestamp.clone()),
                received_at: Set(received_at),
                ..Default::default()
            });

            locations::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        // Dropping the transaction on an early return rolls back earlier chunks
        txn.commit().await?;

        debug!("Inserted {} locations for device row {}", samples.len(), device.0);
        Ok(samples.len())
    }

    async fn probe_liveness(&self) -> Result<(), StoreError> {
        self.db.ping().await?;
        Ok(())
    }
}

/// A stored sample as kept by [`InMemoryLocationStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLocation {
    pub device: DeviceRef,
    pub sample: LocationSample,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDevice {
    pub id: DeviceRef,
    pub device_id: String,
    pub device_info: Option<DeviceInfo>,
}

#[derive(Default)]
struct MemoryState {
    devices: HashMap<String, StoredDevice>,
    locations: Vec<StoredLocation>,
    next_id: i32,
}

/// Process-local store for development and tests.
///
/// Writes and liveness probes can be made to fail on demand.
#[derive(Default)]
pub struct InMemoryLocationStore {
    state: RwLock<MemoryState>,
    fail_writes: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the liveness probe fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn device(&self, device_id: &str) -> Option<StoredDevice> {
        self.state.read().await.devices.get(device_id).cloned()
    }

    pub async fn locations(&self) -> Vec<StoredLocation> {
        self.state.read().await.locations.clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes are disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LocationStore for InMemoryLocationStore {
    async fn upsert_device(
        &self,
        device_id: &str,
        device_info: Option<&DeviceInfo>,
    ) -> Result<DeviceRef, StoreError> {
        self.check_writable()?;

        let mut state = self.state.write().await;
        if let Some(existing) = state.devices.get_mut(device_id) {
            if let Some(info) = device_info {
                existing.device_info = Some(info.clone());
            }
            return Ok(existing.id);
        }

        state.next_id += 1;
        let id = DeviceRef(state.next_id);
        state.devices.insert(
            device_id.to_string(),
            StoredDevice {
                id,
                device_id: device_id.to_string(),
                device_info: device_info.cloned(),
            },
        );
        Ok(id)
    }

    async fn insert_locations(
        &self,
        device: DeviceRef,
        samples: &[LocationSample],
    ) -> Result<usize, StoreError> {
        self.check_writable()?;

        let mut state = self.state.write().await;
        state
            .locations
            .extend(samples.iter().cloned().map(|sample| StoredLocation { device, sample }));
        Ok(samples.len())
    }

    async fn probe_liveness(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("probe failed".to_string()));
        }
        Ok(())
    }
}
