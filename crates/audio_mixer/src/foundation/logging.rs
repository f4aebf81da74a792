//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the logging system
///
/// Panics if a logger was already installed; use [`try_init`] from code that
/// may run more than once (tests, embedded hosts).
pub fn init() {
    builder().init();
}

/// Initialize the logging system, ignoring an already-installed logger
pub fn try_init() -> bool {
    builder().try_init().is_ok()
}

fn builder() -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
}
