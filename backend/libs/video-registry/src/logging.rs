use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    // Ignore the error when a host process already installed a subscriber.
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
