use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Binaries log under their own target (`normalize`, `grep_rows`, ...), so the
// default directive is a plain level rather than a crate filter.
fn filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()))
}

/// Filters write their data to stdout, so every log line goes to stderr.
/// `RUST_LOG` takes precedence over both `verbose` and `quiet_level`.
pub fn init_cli_logger(verbose: bool, quiet_level: Level) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(filter(if verbose { Level::DEBUG } else { quiet_level }))
        .with(layer)
        .init();
}

/// JSON lines for pipeline runs whose logs are collected by another tool.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(filter(Level::INFO))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .json(),
        )
        .init();
}
