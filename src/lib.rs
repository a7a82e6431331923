//! chartscan - vulnerability scanning for every image of a Helm chart
//!
//! The pipeline has two stages:
//!
//! 1. [`chart`]: render the chart with `helm template` and collect the distinct
//!    image references in first-seen order.
//! 2. [`scan`]: run one throwaway scanner container per image through a
//!    [`executor::ContainerExecutor`], strictly one after another, and combine
//!    the reports as plain text or as a single JSON array.
//!
//! [`cache::CacheDir`] owns the vulnerability database directory shared by all
//! scanner containers of a run.
//!
//! # Example Usage
//!
//! ```ignore
//! use chartscan::{CacheDir, ChartReference, ChartScanner, DockerExecutor, HelmRenderer, ScanConfig};
//! use std::sync::Arc;
//!
//! let config = ScanConfig::default();
//! let renderer = Arc::new(HelmRenderer::new(config.render_tool.clone()));
//! let executor = Arc::new(DockerExecutor::connect().await?);
//! let cache = CacheDir::acquire(None)?;
//!
//! let scanner = ChartScanner::new(renderer, executor, config);
//! scanner.prepare().await?;
//! scanner
//!     .scan_chart(&ChartReference::new("stable/mariadb"), cache.path(), &mut std::io::stdout())
//!     .await?;
//! ```

pub mod cache;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod scan;
pub mod util;

pub use cache::CacheDir;
pub use chart::{ChartReference, HelmRenderer, ManifestRenderer, RenderParams};
pub use config::{ConfigError, OutputMode, RegistryCredentials, ScanConfig};
pub use error::{ExecutorError, LifecycleStage, ScanError};
pub use executor::{ContainerExecutor, ContainerSpec, DockerExecutor};
pub use scan::{ChartScanner, ScanOutput, ScanSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
