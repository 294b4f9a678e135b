use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber, writing to stderr so stdout stays parseable.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
    let default_filter = format!("lockup={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let initialized = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();

    if let Err(e) = initialized {
        eprintln!("Warning: logging already initialized: {e}");
    }
}
