use super::{ContainerExecutor, ContainerSpec};
use crate::error::{ExecutorError, LifecycleStage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// One call received by [`MockContainerExecutor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    Pull(String),
    Create(ContainerSpec),
    Start(String),
    Wait(String),
    Logs(String),
    Remove(String),
}

/// In-memory executor replaying scripted scanner output
///
/// Output is looked up by the scanned image, which is the last argument of the
/// container command. Failures are injected per lifecycle stage and container
/// number (1-based, in creation order).
pub struct MockContainerExecutor {
    outputs: Mutex<HashMap<String, String>>,
    failures: Mutex<Vec<(LifecycleStage, usize)>>,
    pull_error: Mutex<Option<String>>,
    exit_code: Mutex<i64>,
    containers: Mutex<Vec<ContainerSpec>>,
    calls: Mutex<Vec<ExecutorCall>>,
}

impl MockContainerExecutor {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(HashMap::new()),
            failures: Mutex::new(Vec::new()),
            pull_error: Mutex::new(None),
            exit_code: Mutex::new(0),
            containers: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn add_output(&self, image: impl Into<String>, output: impl Into<String>) {
        self.outputs
            .lock()
            .unwrap()
            .insert(image.into(), output.into());
    }

    /// Makes `stage` fail for the `container`-th created container
    pub fn fail_at(&self, stage: LifecycleStage, container: usize) {
        self.failures.lock().unwrap().push((stage, container));
    }

    pub fn fail_pull(&self, message: impl Into<String>) {
        *self.pull_error.lock().unwrap() = Some(message.into());
    }

    pub fn set_exit_code(&self, code: i64) {
        *self.exit_code.lock().unwrap() = code;
    }

    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Specs of every container that was successfully created
    pub fn created(&self) -> Vec<ContainerSpec> {
        self.containers.lock().unwrap().clone()
    }

    /// Images scanned by created containers, in creation order
    pub fn scanned_images(&self) -> Vec<String> {
        self.created()
            .iter()
            .filter_map(|spec| spec.cmd.last().cloned())
            .collect()
    }

    pub fn removed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ExecutorCall::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn count_stage(&self, stage: LifecycleStage) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    (stage, call),
                    (LifecycleStage::Create, ExecutorCall::Create(_))
                        | (LifecycleStage::Start, ExecutorCall::Start(_))
                        | (LifecycleStage::Wait, ExecutorCall::Wait(_))
                        | (LifecycleStage::Logs, ExecutorCall::Logs(_))
                        | (LifecycleStage::Remove, ExecutorCall::Remove(_))
                )
            })
            .count()
    }

    fn record(&self, call: ExecutorCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, stage: LifecycleStage, container: usize) -> Result<(), ExecutorError> {
        let failures = self.failures.lock().unwrap();
        if failures.contains(&(stage, container)) {
            return Err(ExecutorError::Failed(format!(
                "injected {} failure for container {}",
                stage, container
            )));
        }
        Ok(())
    }

    fn container_number(id: &str) -> Result<usize, ExecutorError> {
        id.strip_prefix("mock-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| ExecutorError::Failed(format!("no such container: {}", id)))
    }

    fn spec(&self, id: &str) -> Result<ContainerSpec, ExecutorError> {
        let number = Self::container_number(id)?;
        let containers = self.containers.lock().unwrap();
        number
            .checked_sub(1)
            .and_then(|index| containers.get(index))
            .cloned()
            .ok_or_else(|| ExecutorError::Failed(format!("no such container: {}", id)))
    }
}

impl Default for MockContainerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerExecutor for MockContainerExecutor {
    async fn pull_image(&self, image: &str) -> Result<(), ExecutorError> {
        self.record(ExecutorCall::Pull(image.to_string()));
        match self.pull_error.lock().unwrap().clone() {
            Some(message) => Err(ExecutorError::Failed(message)),
            None => Ok(()),
        }
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String, ExecutorError> {
        self.record(ExecutorCall::Create(spec.clone()));
        let number = self.containers.lock().unwrap().len() + 1;
        self.check(LifecycleStage::Create, number)?;
        self.containers.lock().unwrap().push(spec.clone());
        Ok(format!("mock-{}", number))
    }

    async fn start(&self, id: &str) -> Result<(), ExecutorError> {
        self.record(ExecutorCall::Start(id.to_string()));
        self.check(LifecycleStage::Start, Self::container_number(id)?)
    }

    async fn wait(&self, id: &str) -> Result<i64, ExecutorError> {
        self.record(ExecutorCall::Wait(id.to_string()));
        self.check(LifecycleStage::Wait, Self::container_number(id)?)?;
        Ok(*self.exit_code.lock().unwrap())
    }

    async fn logs(&self, id: &str) -> Result<String, ExecutorError> {
        self.record(ExecutorCall::Logs(id.to_string()));
        self.check(LifecycleStage::Logs, Self::container_number(id)?)?;
        let spec = self.spec(id)?;
        let image = spec.cmd.last().cloned().unwrap_or_default();
        Ok(self
            .outputs
            .lock()
            .unwrap()
            .get(&image)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove(&self, id: &str) -> Result<(), ExecutorError> {
        self.record(ExecutorCall::Remove(id.to_string()));
        self.check(LifecycleStage::Remove, Self::container_number(id)?)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
