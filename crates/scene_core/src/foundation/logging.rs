//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace, LevelFilter};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `default_level`. Call once from the
/// binary, never from library code or tests.
pub fn init(default_level: LevelFilter) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level.as_str()))
        .format_timestamp_millis()
        .init();
}
