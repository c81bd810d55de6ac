use tracing_subscriber::EnvFilter;

/// Initialize tracing output for the CLI. RUST_LOG overrides the default
/// INFO level.
pub fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .init();
}
