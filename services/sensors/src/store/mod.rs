//! Storage contract for sensor records.
//!
//! The service layer talks to storage only through [`SensorStore`]. Every
//! backend must implement the same matching and merge rules as
//! [`Sensor::matches`] and [`Sensor::apply_update`].

pub mod memory;
pub mod postgres;

use crate::model::Sensor;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use memory::InMemorySensorStore;
pub use postgres::PgSensorStore;

/// Errors reported by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Sensor already exists: {0}")]
    AlreadyExists(String),

    #[error("Sensor not found: {0}")]
    NotFound(String),

    #[error("Invalid sensor record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage backend for sensors
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Insert a sensor and return the stored record.
    ///
    /// An empty id is replaced with a freshly generated one. A duplicate id
    /// fails with [`StoreError::AlreadyExists`].
    async fn create_sensor(&self, sensor: Sensor) -> StoreResult<Sensor>;

    /// Return every sensor matching `query`
    async fn get_sensors(&self, query: &Sensor) -> StoreResult<Vec<Sensor>>;

    /// Apply `update` to every sensor matching `selector` and return the
    /// updated records
    async fn update_sensors(&self, selector: &Sensor, update: &Sensor) -> StoreResult<Vec<Sensor>>;

    /// Readiness probe
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: SensorStore + ?Sized> SensorStore for Arc<T> {
    async fn create_sensor(&self, sensor: Sensor) -> StoreResult<Sensor> {
        (**self).create_sensor(sensor).await
    }

    async fn get_sensors(&self, query: &Sensor) -> StoreResult<Vec<Sensor>> {
        (**self).get_sensors(query).await
    }

    async fn update_sensors(&self, selector: &Sensor, update: &Sensor) -> StoreResult<Vec<Sensor>> {
        (**self).update_sensors(selector, update).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        (**self).health_check().await
    }
}

/// Generate an id for a sensor created without one
pub(crate) fn new_sensor_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
