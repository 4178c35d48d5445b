use crate::config::GrpcConfig;
use crate::model::{Sensor, SensorUpdate};
use crate::proto::{self, sensor_service_server};
use crate::service::{SensorService, ServiceError};
use crate::store::{SensorStore, StoreError};
use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{error, info, instrument, warn};

/// gRPC front for [`SensorService`]
pub struct GrpcSensorService<S: SensorStore> {
    inner: Arc<SensorService<S>>,
}

impl<S: SensorStore> GrpcSensorService<S> {
    pub fn new(inner: Arc<SensorService<S>>) -> Self {
        Self { inner }
    }
}

impl From<ServiceError> for Status {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(message) => Status::invalid_argument(message),
            ServiceError::Store(StoreError::AlreadyExists(id)) => {
                Status::already_exists(format!("sensor {} already exists", id))
            }
            ServiceError::Store(StoreError::NotFound(what)) => {
                Status::not_found(format!("{} not found", what))
            }
            ServiceError::Store(StoreError::InvalidRecord(message)) => {
                Status::failed_precondition(message)
            }
            ServiceError::Store(StoreError::Database(e)) => {
                error!(error = %e, "Storage backend error");
                match e {
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                        Status::unavailable("storage backend unavailable")
                    }
                    _ => Status::internal("storage backend error"),
                }
            }
        }
    }
}

#[tonic::async_trait]
impl<S: SensorStore + 'static> sensor_service_server::SensorService for GrpcSensorService<S> {
    #[instrument(skip_all)]
    async fn create_sensor(
        &self,
        request: Request<proto::Sensor>,
    ) -> Result<Response<proto::Sensor>, Status> {
        let sensor = Sensor::from(request.into_inner());
        let created = self.inner.create_sensor(sensor).await.map_err(|e| {
            warn!(error = %e, "CreateSensor failed");
            Status::from(e)
        })?;

        Ok(Response::new(created.into()))
    }

    #[instrument(skip_all)]
    async fn read_sensors(
        &self,
        request: Request<proto::Sensor>,
    ) -> Result<Response<proto::Sensors>, Status> {
        let query = Sensor::from(request.into_inner());
        let sensors = self.inner.read_sensors(&query).await.map_err(|e| {
            warn!(error = %e, "ReadSensors failed");
            Status::from(e)
        })?;

        Ok(Response::new(sensors.into()))
    }

    #[instrument(skip_all)]
    async fn update_sensors(
        &self,
        request: Request<proto::SensorUpdate>,
    ) -> Result<Response<proto::Sensors>, Status> {
        let update = SensorUpdate::from(request.into_inner());
        let updated = self.inner.update_sensors(&update).await.map_err(|e| {
            warn!(error = %e, "UpdateSensors failed");
            Status::from(e)
        })?;

        Ok(Response::new(updated.into()))
    }
}

/// Serve the sensor gRPC API until `shutdown` resolves
pub async fn start_grpc_server<S, F>(
    service: Arc<SensorService<S>>,
    config: &GrpcConfig,
    shutdown: F,
) -> Result<()>
where
    S: SensorStore + 'static,
    F: Future<Output = ()>,
{
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid gRPC listen address")?;

    info!(address = %addr, "Starting sensor gRPC server");

    tonic::transport::Server::builder()
        .add_service(sensor_service_server::SensorServiceServer::new(
            GrpcSensorService::new(service),
        ))
        .serve_with_shutdown(addr, shutdown)
        .await
        .context("gRPC server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::testing::RecordingLog;
    use crate::proto::sensor_service_server::SensorService as _;
    use crate::store::InMemorySensorStore;
    use tonic::Code;

    fn grpc_service(sensors: Vec<Sensor>) -> GrpcSensorService<InMemorySensorStore> {
        let service = SensorService::new(
            InMemorySensorStore::with_sensors(sensors),
            Arc::new(RecordingLog::default()),
        );
        GrpcSensorService::new(Arc::new(service))
    }

    fn wire_sensor(uuid: &str) -> proto::Sensor {
        proto::Sensor {
            uuid: uuid.to_string(),
            collection: format!("collection-{}", uuid),
            name: format!("name-{}", uuid),
            unit: "fake-unit".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_read_over_grpc() {
        let svc = grpc_service(vec![]);

        let created = svc
            .create_sensor(Request::new(wire_sensor("fake1")))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(created, wire_sensor("fake1"));

        let list = svc
            .read_sensors(Request::new(proto::Sensor::default()))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(list.count, 1);
        assert_eq!(list.sensors, vec![wire_sensor("fake1")]);
    }

    #[tokio::test]
    async fn test_missing_selector_is_invalid_argument() {
        let svc = grpc_service(vec![Sensor::from(wire_sensor("fake1"))]);

        let status = svc
            .update_sensors(Request::new(proto::SensorUpdate {
                selector: None,
                update: Some(proto::Sensor {
                    name: "renamed".to_string(),
                    ..Default::default()
                }),
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "selector and update must be populated");
    }

    #[tokio::test]
    async fn test_duplicate_create_is_already_exists() {
        let svc = grpc_service(vec![Sensor::from(wire_sensor("fake1"))]);

        let status = svc
            .create_sensor(Request::new(wire_sensor("fake1")))
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::AlreadyExists);
    }

    #[test]
    fn test_store_error_codes() {
        let code_of = |err: StoreError| Status::from(ServiceError::from(err)).code();

        assert_eq!(
            code_of(StoreError::NotFound("sensor x".to_string())),
            Code::NotFound
        );
        assert_eq!(
            code_of(StoreError::InvalidRecord("bad".to_string())),
            Code::FailedPrecondition
        );
        assert_eq!(
            code_of(StoreError::Database(sqlx::Error::PoolTimedOut)),
            Code::Unavailable
        );
        assert_eq!(
            code_of(StoreError::Database(sqlx::Error::RowNotFound)),
            Code::Internal
        );
    }

    #[test]
    fn test_backend_details_are_not_leaked() {
        let status = Status::from(ServiceError::from(StoreError::Database(
            sqlx::Error::Protocol("secret detail".to_string()),
        )));
        assert!(!status.message().contains("secret"));
    }
}
