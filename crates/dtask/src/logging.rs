//! Subscriber setup for binaries and tests

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "DTASK_LOG";

/// Install a fmt subscriber filtered by `DTASK_LOG` (default `info`)
///
/// Accepts `EnvFilter` syntax, e.g. `DTASK_LOG=dtask_runtime=debug`.
/// Returns false if a global subscriber was already installed.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging();
        assert!(!init_logging());
    }
}
