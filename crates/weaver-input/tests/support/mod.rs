#![allow(dead_code)]

pub mod harness;
pub mod logging_buffer;

/// Install a fmt subscriber writing to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
