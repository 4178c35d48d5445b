//! Sensor Service
//!
//! gRPC service managing sensor records: create a sensor, read the sensors
//! matching a template, and bulk-update the sensors matching a selector.
//!
//! ## Architecture
//!
//! ```text
//! gRPC client
//!      │
//!      ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ GrpcSensor   │────▶│ Sensor       │────▶│ SensorStore      │
//! │ Service      │     │ Service      │     │  ├ PgSensorStore │
//! └──────────────┘     └──────────────┘     │  └ InMemory      │
//!   Status codes         Log (injected)     └──────────────────┘
//! ```
//!
//! ## Matching and updates
//!
//! A [`Sensor`] doubles as a template. Empty strings mean "not set":
//! a template matches every sensor whose fields equal its set fields, and an
//! update overwrites only its set fields. Annotations in an update replace
//! the whole annotation list.

pub mod canonical;
pub mod config;
pub mod grpc;
pub mod health;
pub mod logger;
pub mod model;
pub mod proto;
pub mod service;
pub mod store;

pub use canonical::{canonical_string, sensor_lists_equal};
pub use config::{Config, StoreBackend};
pub use grpc::GrpcSensorService;
pub use logger::{Log, TracingLog};
pub use model::{Annotation, Sensor, SensorList, SensorUpdate};
pub use service::{SensorService, ServiceError};
pub use store::{InMemorySensorStore, PgSensorStore, SensorStore, StoreError};
