use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `PGN_LOG=warn`.
pub const LOG_ENV: &str = "PGN_LOG";
const DEFAULT_LEVEL: &str = "error";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs a stderr subscriber filtered by `PGN_LOG` (default `error`).
///
/// Returns `false` if a global subscriber was already set; calling it more
/// than once is harmless.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn test_init_is_idempotent() {
        let _ = init();
        assert!(!init());
    }
}
