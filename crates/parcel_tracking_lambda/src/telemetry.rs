use tracing_subscriber::EnvFilter;

/// Installs a JSON subscriber filtered by `LOG_LEVEL`. CloudWatch stamps each
/// line, so the formatter omits timestamps.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level.trim().to_ascii_lowercase())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}
