//! Tracing bootstrap for app shells and test harnesses.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber honouring `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_default();
    let _ = fmt().with_env_filter(filter).try_init();
}
