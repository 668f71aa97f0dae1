use tracing_subscriber::EnvFilter;

/// Stderr logging, `info` unless `RUST_LOG` says otherwise. Stdout carries the JSON report.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
