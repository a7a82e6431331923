use crate::config::{OutputMode, ScanConfig};
use crate::error::{LifecycleStage, ScanError};
use crate::executor::{ContainerExecutor, ContainerSpec};
use std::path::Path;
use tracing::{debug, warn};

/// Where the vulnerability cache is mounted inside the scanner container
pub const CACHE_MOUNT_PATH: &str = "/.cache";

const USERNAME_ENV: &str = "TRIVY_USERNAME";
const PASSWORD_ENV: &str = "TRIVY_PASSWORD";

/// Raw output of one scanner run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    pub image: String,
    pub mode: OutputMode,
    pub text: String,
    pub exit_code: i64,
}

/// Describes the scanner container for `image`
///
/// Command layout: optional subcommand, cache dir, format, verbosity,
/// passthrough args, then the image as the last argument.
pub fn build_container_spec(image: &str, cache_dir: &Path, config: &ScanConfig) -> ContainerSpec {
    let mut cmd: Vec<String> = Vec::new();
    if let Some(subcommand) = &config.scanner_subcommand {
        cmd.push(subcommand.clone());
    }
    cmd.push("--cache-dir".to_string());
    cmd.push(CACHE_MOUNT_PATH.to_string());

    if config.output_mode == OutputMode::Json {
        cmd.push("-f".to_string());
        cmd.push("json".to_string());
    }
    cmd.push(if config.debug { "-d" } else { "-q" }.to_string());
    cmd.extend(config.scanner_args.split_whitespace().map(str::to_string));
    cmd.push(image.to_string());

    let env = match &config.credentials {
        Some(creds) => vec![
            format!("{}={}", USERNAME_ENV, creds.username),
            format!("{}={}", PASSWORD_ENV, creds.password),
        ],
        None => Vec::new(),
    };

    ContainerSpec {
        image: config.scanner_image.clone(),
        cmd,
        env,
        binds: vec![format!("{}:{}", cache_dir.display(), CACHE_MOUNT_PATH)],
        user: Some(config.scan_user.clone()),
        tty: true,
    }
}

/// Scans one image in a fresh scanner container
///
/// The container is removed once it was created, whatever happens afterwards.
/// A failed removal is only logged. Any other lifecycle failure is returned as
/// [`ScanError::ExecutorLifecycle`].
pub async fn scan_image(
    executor: &dyn ContainerExecutor,
    image: &str,
    cache_dir: &Path,
    config: &ScanConfig,
) -> Result<ScanOutput, ScanError> {
    let spec = build_container_spec(image, cache_dir, config);

    let id = executor
        .create(&spec)
        .await
        .map_err(|e| ScanError::lifecycle(LifecycleStage::Create, image, e))?;
    debug!("Starting container {} with command: {:?}", id, spec.cmd);

    let result = run_to_completion(executor, &id, image).await;

    if let Err(e) = executor.remove(&id).await {
        warn!("Could not remove scanner container {}: {}", id, e);
    }

    let (exit_code, text) = result?;
    if exit_code != 0 {
        debug!("Scanner for {} exited with status {}", image, exit_code);
    }

    Ok(ScanOutput {
        image: image.to_string(),
        mode: config.output_mode,
        text,
        exit_code,
    })
}

async fn run_to_completion(
    executor: &dyn ContainerExecutor,
    id: &str,
    image: &str,
) -> Result<(i64, String), ScanError> {
    executor
        .start(id)
        .await
        .map_err(|e| ScanError::lifecycle(LifecycleStage::Start, image, e))?;

    let exit_code = executor
        .wait(id)
        .await
        .map_err(|e| ScanError::lifecycle(LifecycleStage::Wait, image, e))?;

    let text = executor
        .logs(id)
        .await
        .map_err(|e| ScanError::lifecycle(LifecycleStage::Logs, image, e))?;

    Ok((exit_code, text))
}
