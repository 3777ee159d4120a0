use tracing_subscriber::EnvFilter;

/// Log level matching a verbosity level of the command line.
pub fn level_for_verbosity(verbosity: i32) -> &'static str {
    match verbosity {
        i32::MIN..=-1 => "error",
        0 => "warn",
        1 => "info",
        2..=4 => "debug",
        _ => "trace",
    }
}

/// Initialize structured logging with tracing-subscriber.
///
/// Uses the `RUST_LOG` env var if set, otherwise falls back to the level
/// derived from `verbosity`.
pub fn init(verbosity: i32) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
