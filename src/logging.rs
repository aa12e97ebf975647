//! Logger setup shared by the binaries.

use env_logger::Env;

/// Install the `env_logger` backend. `RUST_LOG` wins over `default_level`.
///
/// Returns false if a logger was already installed, which happens when
/// tests call this more than once.
pub fn init(default_level: &str) -> bool {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
