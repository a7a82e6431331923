use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Step of a scanner container's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Create,
    Start,
    Wait,
    Logs,
    Remove,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleStage::Create => "create",
            LifecycleStage::Start => "start",
            LifecycleStage::Wait => "wait for",
            LifecycleStage::Logs => "read logs of",
            LifecycleStage::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// Failures reported by a container executor
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Docker API error: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error("{0}")]
    Failed(String),
}

/// Errors that abort a chart scan
///
/// Every variant is fatal for the whole run: there is no partial-success mode
/// and no step is retried.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The render tool could not be run or exited with a failure
    #[error("Could not find images for chart {chart}: {reason}")]
    Render { chart: String, reason: String },

    /// Rendering succeeded but produced no image references
    #[error("No images found in chart {chart}")]
    EmptyResult { chart: String },

    /// A scanner container could not be driven through its lifecycle
    #[error("Could not {stage} scanner container for image {image}: {source}")]
    ExecutorLifecycle {
        stage: LifecycleStage,
        image: String,
        #[source]
        source: ExecutorError,
    },

    /// Pulling the scanner's own image failed
    #[error("Could not pull scanner image {image}: {source}")]
    ImagePull {
        image: String,
        #[source]
        source: ExecutorError,
    },

    /// The container runtime is not reachable
    #[error("Could not connect to container runtime: {0}")]
    ExecutorUnavailable(#[source] ExecutorError),

    /// The vulnerability cache directory could not be created
    #[error("Could not create cache dir {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing scan results failed
    #[error("Failed to write scan output: {0}")]
    Output(#[from] io::Error),
}

impl ScanError {
    pub(crate) fn lifecycle(
        stage: LifecycleStage,
        image: &str,
        source: impl Into<ExecutorError>,
    ) -> Self {
        ScanError::ExecutorLifecycle {
            stage,
            image: image.to_string(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_error_names_stage_and_image() {
        let err = ScanError::lifecycle(
            LifecycleStage::Start,
            "nginx:1.25",
            ExecutorError::Failed("no such container".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Could not start scanner container for image nginx:1.25: no such container"
        );
    }

    #[test]
    fn test_render_and_empty_are_distinct() {
        let render = ScanError::Render {
            chart: "stable/mariadb".to_string(),
            reason: "exit status: 1".to_string(),
        };
        let empty = ScanError::EmptyResult {
            chart: "stable/mariadb".to_string(),
        };
        assert!(matches!(render, ScanError::Render { .. }));
        assert!(matches!(empty, ScanError::EmptyResult { .. }));
        assert_eq!(empty.to_string(), "No images found in chart stable/mariadb");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(LifecycleStage::Create.to_string(), "create");
        assert_eq!(LifecycleStage::Wait.to_string(), "wait for");
        assert_eq!(LifecycleStage::Logs.to_string(), "read logs of");
    }
}
