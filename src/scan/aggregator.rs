use super::scanner::scan_image;
use crate::chart::{extract_images, ChartReference, ManifestRenderer};
use crate::config::{OutputMode, ScanConfig};
use crate::error::ScanError;
use crate::executor::ContainerExecutor;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a completed chart scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub chart: String,
    /// Images in the order they were scanned
    pub images: Vec<String>,
    pub mode: OutputMode,
}

/// Joins per-image JSON arrays into one array
///
/// This splices the documents textually: every `][` becomes `,`. Each input
/// must be exactly one top-level array without trailing data, otherwise the
/// result is not valid JSON.
pub fn merge_json_outputs<I, S>(outputs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut combined = String::new();
    for output in outputs {
        combined.push_str(output.as_ref());
    }
    combined.replace("][", ",")
}

/// Scans every image of a chart, one container at a time
pub struct ChartScanner {
    renderer: Arc<dyn ManifestRenderer>,
    executor: Arc<dyn ContainerExecutor>,
    config: ScanConfig,
}

impl ChartScanner {
    pub fn new(
        renderer: Arc<dyn ManifestRenderer>,
        executor: Arc<dyn ContainerExecutor>,
        config: ScanConfig,
    ) -> Self {
        Self {
            renderer,
            executor,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Pulls the scanner image unless pulling is disabled
    pub async fn prepare(&self) -> Result<(), ScanError> {
        if self.config.skip_pull {
            debug!("Skipping pull of {}", self.config.scanner_image);
            return Ok(());
        }

        info!("Pulling latest scanner image {}", self.config.scanner_image);
        self.executor
            .pull_image(&self.config.scanner_image)
            .await
            .map_err(|source| ScanError::ImagePull {
                image: self.config.scanner_image.clone(),
                source,
            })?;
        info!("Pulled latest scanner image");
        Ok(())
    }

    /// Extracts the chart's images and scans them in order, writing to `out`
    ///
    /// Human output is written and flushed per image. JSON output is merged and
    /// written once after the last image. The first error stops the run.
    pub async fn scan_chart<W: Write>(
        &self,
        chart: &ChartReference,
        cache_dir: &Path,
        out: &mut W,
    ) -> Result<ScanSummary, ScanError> {
        info!("Scanning chart {}", chart.chart);
        debug!(
            "Rendering with {}, scanning on {}",
            self.renderer.name(),
            self.executor.name()
        );

        let images = extract_images(self.renderer.as_ref(), chart).await?;
        let mode = self.config.output_mode;
        let mut json_outputs: Vec<String> = Vec::new();

        for image in &images {
            debug!("Scanning image {}", image);
            let output =
                scan_image(self.executor.as_ref(), image, cache_dir, &self.config).await?;

            match mode {
                OutputMode::Human => {
                    writeln!(out, "{}", output.text)?;
                    out.flush()?;
                }
                OutputMode::Json => json_outputs.push(output.text),
            }
        }

        if mode == OutputMode::Json {
            writeln!(out, "{}", merge_json_outputs(&json_outputs))?;
            out.flush()?;
        }

        Ok(ScanSummary {
            chart: chart.chart.clone(),
            images,
            mode,
        })
    }
}
