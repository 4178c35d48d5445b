//! Sensor service logic.
//!
//! Sits between the RPC handlers and a [`SensorStore`]. Requests are checked,
//! forwarded to the store, and the results wrapped for the RPC boundary.
//! Store errors are passed through unchanged; the gRPC layer decides how
//! each kind is reported.

use crate::logger::Log;
use crate::model::{Sensor, SensorList, SensorUpdate};
use crate::store::{SensorStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`SensorService`]
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Create, read and bulk-update operations over a sensor store
pub struct SensorService<S: SensorStore> {
    store: S,
    logger: Arc<dyn Log>,
}

impl<S: SensorStore> SensorService<S> {
    pub fn new(store: S, logger: Arc<dyn Log>) -> Self {
        Self { store, logger }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store a new sensor and return the stored record
    pub async fn create_sensor(&self, sensor: Sensor) -> ServiceResult<Sensor> {
        let created = self.store.create_sensor(sensor).await?;
        self.logger.print(format_args!("Created {:?} in data repo", created));

        metrics::counter!("sensors.created").increment(1);

        Ok(created)
    }

    /// Return every sensor matching `query`
    pub async fn read_sensors(&self, query: &Sensor) -> ServiceResult<SensorList> {
        let sensors = self.store.get_sensors(query).await?;
        self.logger.print(format_args!("Got {:?} from data repo", sensors));

        Ok(sensors.into())
    }

    /// Apply `request.update` to every sensor matching `request.selector`.
    ///
    /// Fails with [`ServiceError::InvalidArgument`] before reaching the store
    /// when either half of the request is missing.
    pub async fn update_sensors(&self, request: &SensorUpdate) -> ServiceResult<SensorList> {
        let (selector, update) = match (&request.selector, &request.update) {
            (Some(selector), Some(update)) => (selector, update),
            _ => {
                return Err(ServiceError::InvalidArgument(
                    "selector and update must be populated".to_string(),
                ))
            }
        };

        self.logger.debug(format_args!(
            "Updating sensors matching {:?} with {:?}",
            selector, update
        ));

        let updated = self.store.update_sensors(selector, update).await?;
        self.logger.print(format_args!("Updated {} sensors in data repo", updated.len()));

        metrics::counter!("sensors.updated").increment(updated.len() as u64);

        Ok(updated.into())
    }
}
