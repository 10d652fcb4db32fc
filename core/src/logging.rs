//! Tracing setup for test binaries.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a test-friendly `tracing` subscriber once per process.
///
/// Output goes through the test writer, so it is captured per test like
/// `println!`. The filter comes from `RUST_LOG`, defaulting to `warn`. If some
/// other subscriber is already installed it is left alone.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(env_filter)
            .try_init();
    });
}
