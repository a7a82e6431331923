//! Per-image scanning and per-chart aggregation

pub mod aggregator;
pub mod scanner;

pub use aggregator::{merge_json_outputs, ChartScanner, ScanSummary};
pub use scanner::{build_container_spec, scan_image, ScanOutput, CACHE_MOUNT_PATH};
