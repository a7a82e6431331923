use super::ChartReference;
use crate::error::ScanError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Substring that marks a manifest line as an image reference
pub const IMAGE_MARKER: &str = "image: ";

/// Produces rendered manifest text for a chart
#[async_trait]
pub trait ManifestRenderer: Send + Sync {
    async fn render(&self, chart: &ChartReference) -> Result<String, ScanError>;

    fn name(&self) -> &str;
}

/// Renders charts by running `<tool> template ...`
///
/// The call blocks until the tool exits; no timeout is applied.
#[derive(Debug, Clone)]
pub struct HelmRenderer {
    tool: String,
}

impl HelmRenderer {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }
}

impl Default for HelmRenderer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RENDER_TOOL)
    }
}

#[async_trait]
impl ManifestRenderer for HelmRenderer {
    async fn render(&self, chart: &ChartReference) -> Result<String, ScanError> {
        let args = chart.render_args();
        debug!("Running render command: {} {:?}", self.tool, args);

        let output = Command::new(&self.tool)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ScanError::Render {
                chart: chart.chart.clone(),
                reason: format!("failed to run {}: {}", self.tool, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let reason = if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr)
            };
            return Err(ScanError::Render {
                chart: chart.chart.clone(),
                reason,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        &self.tool
    }
}

/// Collects distinct image references from rendered manifest text
///
/// Only lines containing [`IMAGE_MARKER`] are considered. The value is the text
/// after the first marker with enclosing double quotes trimmed. Order is
/// first-seen order.
pub fn parse_images(rendered: &str) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();

    for line in rendered.lines() {
        let Some((_, value)) = line.split_once(IMAGE_MARKER) else {
            continue;
        };
        let image = value.trim_matches('"');
        debug!("Found image {}", image);

        if !images.iter().any(|known| known == image) {
            images.push(image.to_string());
        }
    }

    images
}

/// Renders `chart` and returns its distinct images
///
/// Fails with [`ScanError::Render`] when rendering fails and with
/// [`ScanError::EmptyResult`] when no image line was found.
pub async fn extract_images(
    renderer: &dyn ManifestRenderer,
    chart: &ChartReference,
) -> Result<Vec<String>, ScanError> {
    let rendered = renderer.render(chart).await?;
    let images = parse_images(&rendered);

    if images.is_empty() {
        return Err(ScanError::EmptyResult {
            chart: chart.chart.clone(),
        });
    }

    debug!("Found images for chart {}: {:?}", chart.chart, images);
    Ok(images)
}
