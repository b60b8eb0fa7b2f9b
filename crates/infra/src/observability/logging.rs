//! Tracing/logging initialization.

use smsdesk_domain::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` takes precedence over `config.level`. Safe to call multiple
/// times (subsequent calls are no-ops); returns whether this call installed
/// the subscriber.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = build_filter(config);

    let installed = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init()
    };

    installed.is_ok()
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let config = LoggingConfig { level: "debug".into(), json: true };
        let _ = init(&config);
        assert!(!init(&config));
    }

    #[test]
    fn invalid_level_falls_back_instead_of_panicking() {
        let config = LoggingConfig { level: "not a [valid directive".into(), json: false };
        let _ = build_filter(&config);
    }
}
