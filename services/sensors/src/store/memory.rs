use super::{new_sensor_id, SensorStore, StoreError, StoreResult};
use crate::model::Sensor;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Sensor store backed by a vector in memory.
///
/// Keeps insertion order. Used for local runs (`store.backend = "memory"`)
/// and as the reference backend in tests.
#[derive(Debug, Default)]
pub struct InMemorySensorStore {
    sensors: RwLock<Vec<Sensor>>,
}

impl InMemorySensorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `sensors`.
    ///
    /// Ids stay unique: a sensor whose id was already seen is skipped, so the
    /// first occurrence wins.
    pub fn with_sensors(sensors: impl IntoIterator<Item = Sensor>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();

        for sensor in sensors {
            if seen.insert(sensor.id.clone()) {
                unique.push(sensor);
            } else {
                warn!(id = %sensor.id, "Skipping seed sensor with duplicate id");
            }
        }

        Self {
            sensors: RwLock::new(unique),
        }
    }

    /// Copy of every stored sensor
    pub fn snapshot(&self) -> Vec<Sensor> {
        self.sensors.read().clone()
    }

    pub fn len(&self) -> usize {
        self.sensors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.read().is_empty()
    }
}

#[async_trait]
impl SensorStore for InMemorySensorStore {
    async fn create_sensor(&self, mut sensor: Sensor) -> StoreResult<Sensor> {
        let mut sensors = self.sensors.write();

        if sensor.id.is_empty() {
            sensor.id = new_sensor_id();
        } else if sensors.iter().any(|s| s.id == sensor.id) {
            return Err(StoreError::AlreadyExists(sensor.id));
        }

        sensors.push(sensor.clone());
        debug!(id = %sensor.id, total = sensors.len(), "Sensor stored in memory");

        Ok(sensor)
    }

    async fn get_sensors(&self, query: &Sensor) -> StoreResult<Vec<Sensor>> {
        Ok(self
            .sensors
            .read()
            .iter()
            .filter(|s| s.matches(query))
            .cloned()
            .collect())
    }

    async fn update_sensors(&self, selector: &Sensor, update: &Sensor) -> StoreResult<Vec<Sensor>> {
        let mut sensors = self.sensors.write();
        let mut updated = Vec::new();

        for sensor in sensors.iter_mut().filter(|s| s.matches(selector)) {
            sensor.apply_update(update);
            updated.push(sensor.clone());
        }

        Ok(updated)
    }
}
