//! Tracing subscriber set-up shared by the binaries

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "argus=info,http_server=info,tower_http=info";

/// Installs a formatting subscriber filtered by `RUST_LOG`, falling back to
/// info-level output for Argus and the HTTP layer. Logs go to stderr so that
/// JSON on stdout stays clean. Calling it twice is a no-op.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
