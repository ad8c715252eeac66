use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "payhub=info";

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// `payhub=info` filter. Logs go to stderr so stdout stays machine-readable.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
