//! Logging setup.

use tracing_subscriber::EnvFilter;

use coolhand_core::Config;

/// Returns the filter used when `RUST_LOG` is unset.
pub fn default_directive(config: &Config) -> String {
    format!("coolhand={},warn", config.effective_log_level())
}

/// Installs a console subscriber for the given configuration.
///
/// `RUST_LOG` overrides the configured level. Returns false if a global
/// subscriber was already installed, in which case nothing changes.
pub fn init(config: &Config) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_uses_configured_level() {
        let config = Config::new().with_log_level("warn");
        assert_eq!(default_directive(&config), "coolhand=warn,warn");
    }

    #[test]
    fn directive_honours_debug() {
        let config = Config::new().with_debug(true);
        assert_eq!(default_directive(&config), "coolhand=debug,warn");
    }

    #[test]
    fn second_init_is_noop() {
        let config = Config::default();
        init(&config);
        assert!(!init(&config));
    }
}
