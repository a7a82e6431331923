//! Structured logging setup for chartscan
//!
//! Logs go to stderr so that stdout only carries scan reports. The level is
//! taken, in order, from `--log-level`, `--debug`, `CHARTSCAN_LOG_LEVEL` and
//! finally defaults to INFO. `RUST_LOG` still wins when it is set, and
//! `CHARTSCAN_LOG_JSON=true` switches to JSON lines.
//!
//! # Example
//!
//! ```no_run
//! use chartscan::util::{init_logging, LoggingConfig};
//! use tracing::Level;
//!
//! init_logging(LoggingConfig::with_level(Level::DEBUG));
//! tracing::debug!(chart = "stable/mariadb", "Rendering chart");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., chartscan::scan) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Picks the level from CLI flags, then from the environment
    pub fn resolve(log_level: Option<&str>, debug: bool) -> Self {
        let level = if let Some(level_str) = log_level {
            parse_level(level_str)
        } else if debug {
            Level::DEBUG
        } else {
            let level_str = env::var("CHARTSCAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        };

        let use_json = env::var("CHARTSCAN_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            include_target: level >= Level::DEBUG,
            include_location: false,
        }
    }
}

/// Parses a log level from a string, falling back to INFO
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Initializes the tracing subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(format!("chartscan={}", config.level).parse().unwrap())
                .add_directive("bollard=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap());
        }

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("loud"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    #[serial]
    fn test_resolve_precedence() {
        env::set_var("CHARTSCAN_LOG_LEVEL", "warn");

        assert_eq!(LoggingConfig::resolve(Some("error"), true).level, Level::ERROR);
        assert_eq!(LoggingConfig::resolve(None, true).level, Level::DEBUG);
        assert_eq!(LoggingConfig::resolve(None, false).level, Level::WARN);

        env::remove_var("CHARTSCAN_LOG_LEVEL");
        assert_eq!(LoggingConfig::resolve(None, false).level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_resolve_json_from_env() {
        env::set_var("CHARTSCAN_LOG_JSON", "true");
        assert!(LoggingConfig::resolve(None, false).use_json);
        env::set_var("CHARTSCAN_LOG_JSON", "nope");
        assert!(!LoggingConfig::resolve(None, false).use_json);
        env::remove_var("CHARTSCAN_LOG_JSON");
    }

    #[test]
    fn test_debug_includes_target() {
        assert!(LoggingConfig::resolve(Some("debug"), false).include_target);
        assert!(!LoggingConfig::resolve(Some("info"), false).include_target);
    }
}
