use std::sync::Once;

use config::Environment;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Tests only print logs when this variable is set, to keep `cargo test` output readable.
const TEST_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to install the log bridge: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Keep it alive for the whole lifetime of the process, dropping it early silently discards
/// log output.
#[must_use = "dropping the flusher stops log output"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global subscriber for a binary.
///
/// Logs go to stderr through a non-blocking writer, as JSON in production and as human
/// readable lines otherwise. Stdout is left to the binary's own output.
pub fn init_tracing(app_name: &str, environment: Environment) -> Result<LogFlusher, TracingError> {
    tracing_log::LogTracer::init()?;

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json_layer = environment.is_prod().then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(writer.clone())
    });
    let pretty_layer = (!environment.is_prod()).then(|| fmt::layer().with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()?;

    ::tracing::info!(app = app_name, %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}

/// Installs a test subscriber once per process when `ENABLE_TRACING` is set.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var(TEST_TRACING_ENV_NAME).is_err() {
            return;
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
