//! Test doubles shared by the crates' test suites.

pub mod completion;
pub mod engine;
pub mod schemas;

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .try_init();
}
