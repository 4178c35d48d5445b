use crate::config::ApiConfig;
use crate::store::SensorStore;
use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// State shared across health handlers
pub struct HealthState {
    pub service_name: String,
    pub store: Arc<dyn SensorStore>,
}

/// Create the health check router
pub fn create_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint
async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.service_name,
    }))
}

/// Readiness endpoint, checks the storage backend
async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "store": "connected"
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "store": "disconnected",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Start the health API server
pub async fn start_api_server(state: Arc<HealthState>, config: &ApiConfig) -> Result<()> {
    let router = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting health API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemorySensorStore, MockSensorStore, StoreError};

    #[tokio::test]
    async fn test_ready_with_memory_store() {
        let state = Arc::new(HealthState {
            service_name: "sensor-service".to_string(),
            store: Arc::new(InMemorySensorStore::new()),
        });

        let response = readiness_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_when_store_fails() {
        let mut store = MockSensorStore::new();
        store
            .expect_health_check()
            .returning(|| Err(StoreError::Database(sqlx::Error::PoolClosed)));

        let state = Arc::new(HealthState {
            service_name: "sensor-service".to_string(),
            store: Arc::new(store),
        });

        let response = readiness_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_is_always_ok() {
        let state = Arc::new(HealthState {
            service_name: "sensor-service".to_string(),
            store: Arc::new(InMemorySensorStore::new()),
        });

        let response = health_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
