//! Utility modules for chartscan

pub mod logging;

pub use logging::{init_logging, parse_level, LoggingConfig};
