use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;

/// Main configuration for the sensor service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// gRPC server configuration
    #[serde(default)]
    pub grpc: GrpcConfig,
    /// Health API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Storage backend selection
    #[serde(default)]
    pub store: StoreConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Output format (json, pretty)
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Enable Prometheus metrics export
    #[serde(default)]
    pub metrics_enabled: bool,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// gRPC listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GrpcConfig {
    #[serde(default = "default_grpc_host")]
    pub host: String,
    #[serde(default = "default_grpc_port")]
    pub port: u16,
}

/// Health check API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

/// Which storage backend holds the sensors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. When unset, PGHOST, PGPORT, PGUSER,
    /// PGPASSWORD and PGDATABASE are used instead.
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Run migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

// Default value functions
fn default_service_name() -> String {
    "sensor-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_grpc_host() -> String {
    "0.0.0.0".to_string()
}

fn default_grpc_port() -> u16 {
    50051
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_run_migrations() -> bool {
    true
}

impl Config {
    /// Load configuration from an optional file and the environment.
    ///
    /// Sources, later overriding earlier:
    /// 1. `config/sensors.{toml,yaml,json}` or the given path
    /// 2. Environment variables, e.g. `SENSORS__GRPC__PORT` -> grpc.port
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config/sensors").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SENSORS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.validate_with_env(|key| std::env::var_os(key))
    }

    /// Validate against an explicit environment lookup for the `PG*`
    /// fallback variables.
    fn validate_with_env<F>(&self, env: F) -> Result<(), ConfigValidationError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if self.grpc.port == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "grpc.port".to_string(),
                message: "Port must be greater than 0".to_string(),
            });
        }

        if self.grpc.port == self.api.port && self.grpc.host == self.api.host {
            return Err(ConfigValidationError::InvalidValue {
                field: "api.port".to_string(),
                message: "Health API cannot share the gRPC listener".to_string(),
            });
        }

        if self.store.backend == StoreBackend::Postgres {
            if let Some(url) = &self.database.url {
                if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                    return Err(ConfigValidationError::InvalidValue {
                        field: "database.url".to_string(),
                        message: "URL must start with postgres:// or postgresql://".to_string(),
                    });
                }
            } else if env("PGHOST").is_none() && env("PGDATABASE").is_none() {
                return Err(ConfigValidationError::MissingField(
                    "database.url (or PGHOST/PGDATABASE)".to_string(),
                ));
            }

            if self.database.min_connections > self.database.max_connections {
                return Err(ConfigValidationError::InvalidValue {
                    field: "database.min_connections".to_string(),
                    message: "Must not exceed database.max_connections".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            host: default_grpc_host(),
            port: default_grpc_port(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            run_migrations: default_run_migrations(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
