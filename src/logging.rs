use tracing_subscriber::EnvFilter;

/// Installs a `RUST_LOG`-filtered fmt subscriber, defaulting to `info`.
/// Does nothing when the host already installed a subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
