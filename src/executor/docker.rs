use super::{ContainerExecutor, ContainerSpec};
use crate::error::ExecutorError;
use async_trait::async_trait;
use bollard::container::{
    Config, LogsOptions, RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::service::HostConfig;
use bollard::Docker;
use futures_util::stream::StreamExt;
use tracing::debug;

/// Runs containers on the local Docker daemon
///
/// Connection settings come from the environment (`DOCKER_HOST`, ...). None of
/// the calls apply a timeout; `wait` blocks until the container stops.
pub struct DockerExecutor {
    docker: Docker,
}

impl DockerExecutor {
    /// Connects with local defaults and negotiates the API version
    pub async fn connect() -> Result<Self, ExecutorError> {
        let docker = Docker::connect_with_local_defaults()?
            .negotiate_version()
            .await?;
        Ok(Self { docker })
    }
}

/// Splits `repo[:tag]` for the pull API, defaulting the tag to `latest`
///
/// Digest references are passed through untouched with an empty tag.
fn split_image_tag(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(i) => (&image[..name_start + i], &image[name_start + i + 1..]),
        None => (image, "latest"),
    }
}

#[async_trait]
impl ContainerExecutor for DockerExecutor {
    async fn pull_image(&self, image: &str) -> Result<(), ExecutorError> {
        let (from_image, tag) = split_image_tag(image);
        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };

        let mut progress = self.docker.create_image(Some(options), None, None);
        while let Some(info) = progress.next().await {
            let info = info?;
            if let Some(status) = info.status {
                debug!("Pull {}: {}", image, status);
            }
        }
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String, ExecutorError> {
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            env: Some(spec.env.clone()),
            user: spec.user.clone(),
            tty: Some(spec.tty),
            host_config: Some(HostConfig {
                binds: Some(spec.binds.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container::<String, String>(None, config)
            .await?;
        for warning in &response.warnings {
            debug!("Docker warning for {}: {}", response.id, warning);
        }
        Ok(response.id)
    }

    async fn start(&self, id: &str) -> Result<(), ExecutorError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn wait(&self, id: &str) -> Result<i64, ExecutorError> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut wait_stream = self.docker.wait_container(id, Some(options));

        match wait_stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports a non-zero exit as an error; it is still a terminal state
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(e.into()),
            None => Err(ExecutorError::Failed(format!(
                "wait stream for container {} ended without a status",
                id
            ))),
        }
    }

    async fn logs(&self, id: &str) -> Result<String, ExecutorError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: false,
            ..Default::default()
        };

        let mut log_stream = self.docker.logs(id, Some(options));
        let mut output = Vec::new();
        while let Some(chunk) = log_stream.next().await {
            output.extend_from_slice(&chunk?.into_bytes());
        }

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    async fn remove(&self, id: &str) -> Result<(), ExecutorError> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "docker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_image_tag() {
        assert_eq!(split_image_tag("aquasec/trivy"), ("aquasec/trivy", "latest"));
        assert_eq!(
            split_image_tag("aquasec/trivy:0.50.1"),
            ("aquasec/trivy", "0.50.1")
        );
        assert_eq!(
            split_image_tag("registry.local:5000/trivy"),
            ("registry.local:5000/trivy", "latest")
        );
        assert_eq!(
            split_image_tag("registry.local:5000/sec/trivy:canary"),
            ("registry.local:5000/sec/trivy", "canary")
        );
        assert_eq!(
            split_image_tag("aquasec/trivy@sha256:abcd"),
            ("aquasec/trivy@sha256:abcd", "")
        );
    }
}
