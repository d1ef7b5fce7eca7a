//! Structured logging setup for binaries and demos built on this crate.
//!
//! The library itself only emits `tracing` spans and events; installing a
//! subscriber is left to the application.

use thiserror::Error;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::log::SetLoggerError;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install the log bridge: {0}")]
    LogTracer(#[from] SetLoggerError),

    #[error("Failed to set the global subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Builds a bunyan JSON subscriber. `RUST_LOG` overrides `env_filter`.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Installs `subscriber` globally and routes `log` records into it.
/// Call once per process.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), TelemetryError> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_records_spans() {
        let subscriber = get_subscriber("test".into(), "debug".into(), std::io::sink);
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("key aggregation", signers = 3);
            let _guard = span.enter();
            tracing::info!("aggregate key computed");
        });
    }
}
