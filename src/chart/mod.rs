//! Chart references and image extraction from rendered manifests

pub mod extractor;

pub use extractor::{extract_images, parse_images, HelmRenderer, ManifestRenderer, IMAGE_MARKER};

/// Overrides applied when rendering a chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams {
    /// Comma-separated `key=value` overrides
    pub set: Option<String>,
    /// Values file path or URL
    pub values: Option<String>,
    /// Chart version constraint
    pub version: Option<String>,
}

/// A chart to render, plus its render parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartReference {
    pub chart: String,
    pub params: RenderParams,
}

impl ChartReference {
    pub fn new(chart: impl Into<String>) -> Self {
        Self {
            chart: chart.into(),
            params: RenderParams::default(),
        }
    }

    pub fn with_params(chart: impl Into<String>, params: RenderParams) -> Self {
        Self {
            chart: chart.into(),
            params,
        }
    }

    /// Arguments for `<tool> template ...`, with empty parameters left out
    pub fn render_args(&self) -> Vec<String> {
        let mut args = vec!["template".to_string()];

        let flags = [
            ("--set", &self.params.set),
            ("--values", &self.params.values),
            ("--version", &self.params.version),
        ];
        for (flag, value) in flags {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }

        args.push(self.chart.clone());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_args_plain_chart() {
        let chart = ChartReference::new("stable/mariadb");
        assert_eq!(chart.render_args(), vec!["template", "stable/mariadb"]);
    }

    #[test]
    fn test_render_args_all_params_in_order() {
        let chart = ChartReference::with_params(
            "./charts/app",
            RenderParams {
                set: Some("image.tag=1.2.3,replicas=2".to_string()),
                values: Some("https://example.com/values.yaml".to_string()),
                version: Some("^1.0".to_string()),
            },
        );
        assert_eq!(
            chart.render_args(),
            vec![
                "template",
                "--set",
                "image.tag=1.2.3,replicas=2",
                "--values",
                "https://example.com/values.yaml",
                "--version",
                "^1.0",
                "./charts/app",
            ]
        );
    }

    #[test]
    fn test_render_args_skip_empty_params() {
        let chart = ChartReference::with_params(
            "stable/redis",
            RenderParams {
                set: Some(String::new()),
                values: None,
                version: Some("10.5.7".to_string()),
            },
        );
        assert_eq!(
            chart.render_args(),
            vec!["template", "--version", "10.5.7", "stable/redis"]
        );
    }
}
