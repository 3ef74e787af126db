use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_ENV: &str = "MAIL3_LOG_FILE";
const DEFAULT_FILTER: &str = "info";

pub fn init_tracing() {
    init_tracing_with_service("mail3");
}

/// Stderr logging filtered by `RUST_LOG`, plus an optional debug-level file
/// log when `MAIL3_LOG_FILE` is set. Calling this twice is a no-op.
pub fn init_tracing_with_service(service_name: &str) {
    let file_logging = std::env::var(LOG_FILE_ENV).ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file = file_logging.as_deref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some((path, file)),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
                None
            }
        }
    });

    let result = if let Some((path, file)) = file {
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);

        let result = registry.with(file_layer).try_init();
        if result.is_ok() {
            eprintln!("File logging enabled: {}", path);
        }
        result
    } else {
        registry.try_init()
    };

    if result.is_ok() {
        tracing::debug!(service = service_name, "tracing initialized");
    }
}
