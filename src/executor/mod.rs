//! Container execution capability used to run scanners
//!
//! [`ContainerExecutor`] is the seam between the scan pipeline and the container
//! runtime. [`docker::DockerExecutor`] talks to Docker through bollard and
//! [`mock::MockContainerExecutor`] replays scripted results for tests.

pub mod docker;
pub mod mock;

use crate::error::ExecutorError;
use async_trait::async_trait;

pub use docker::DockerExecutor;
pub use mock::MockContainerExecutor;

/// Everything needed to create one container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub cmd: Vec<String>,
    /// `KEY=value` pairs
    pub env: Vec<String>,
    /// `host:container` bind mounts
    pub binds: Vec<String>,
    pub user: Option<String>,
    pub tty: bool,
}

#[async_trait]
pub trait ContainerExecutor: Send + Sync {
    /// Pulls `image` so the newest tag is used for the next containers
    async fn pull_image(&self, image: &str) -> Result<(), ExecutorError>;

    /// Creates a container and returns its id
    async fn create(&self, spec: &ContainerSpec) -> Result<String, ExecutorError>;

    async fn start(&self, id: &str) -> Result<(), ExecutorError>;

    /// Blocks until the container is no longer running and returns its exit code
    async fn wait(&self, id: &str) -> Result<i64, ExecutorError>;

    /// Reads the container's complete stdout
    async fn logs(&self, id: &str) -> Result<String, ExecutorError>;

    async fn remove(&self, id: &str) -> Result<(), ExecutorError>;

    fn name(&self) -> &str;
}
