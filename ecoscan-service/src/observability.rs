use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "ecoscan_service=info,ecoscan_client=info";

/// `RUST_LOG` wins when set; otherwise both workspace crates log at info.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
