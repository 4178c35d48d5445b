//! Logging for the sensor service.
//!
//! The service layer logs through the [`Log`] capability it is constructed
//! with rather than through global macros, so tests can substitute a
//! recording implementation. [`TracingLog`] forwards to `tracing`.

use crate::config::ServiceConfig;
use std::fmt;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

/// Leveled message sink used by the service layer
pub trait Log: Send + Sync {
    /// Emit an informational message
    fn print(&self, args: fmt::Arguments<'_>);

    /// Emit a message only when verbose output is enabled
    fn debug(&self, args: fmt::Arguments<'_>);
}

/// [`Log`] implementation that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog {
    verbose: bool,
}

impl TracingLog {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Log for TracingLog {
    fn print(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "sensor_service", "{}", args);
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        if self.verbose {
            tracing::debug!(target: "sensor_service", "{}", args);
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the default
/// to `debug`.
pub fn init_tracing(config: &ServiceConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?
        .add_directive("h2=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.log_format == "json" {
        subscriber.with(fmt_layer::layer().json()).init();
    } else {
        subscriber.with(fmt_layer::layer().pretty()).init();
    }

    Ok(())
}
