//! Shared test setup: install a panic/error reporter and a tracing
//! subscriber once per process, the way every `#[test]` in this workspace
//! expects to be able to call `ember_test::init()` first.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install `color-eyre` error reporting and a `tracing` subscriber
/// controlled by `RUST_LOG`. Safe to call from every test; only the first
/// call has any effect.
pub fn init() {
    INIT.call_once(|| {
        let _ = color_eyre::install();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
