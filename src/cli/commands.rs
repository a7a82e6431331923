use crate::chart::{ChartReference, RenderParams};
use crate::config::{OutputMode, RegistryCredentials, ScanConfig, DEFAULT_SCAN_USER};
use clap::Parser;
use std::path::PathBuf;

/// Scan every container image referenced by a Helm chart for vulnerabilities
#[derive(Parser, Debug, Clone)]
#[command(
    name = "chartscan",
    about = "Scan every container image referenced by a Helm chart for vulnerabilities",
    version,
    long_about = "chartscan renders a Helm chart with `helm template`, collects every distinct \
                  image it references and scans each one with Trivy in a throwaway container. \
                  Reports are printed in image order, or merged into one JSON array with --json.\n\n\
                  The default scanner image is aquasec/trivy:latest. Current Trivy releases only \
                  accept `trivy image <ref>`, so pass --scanner-subcommand image (or set \
                  CHARTSCAN_SCANNER_SUBCOMMAND=image) unless the scanner image is pinned to an \
                  older release.\n\n\
                  Examples:\n  \
                  chartscan stable/mariadb\n  \
                  chartscan --json --chart-version 7.3.14 stable/mariadb\n  \
                  chartscan --set image.tag=1.2.3 --scanner-args '--severity HIGH,CRITICAL' ./chart"
)]
pub struct CliArgs {
    #[arg(value_name = "CHART", help = "Helm chart to scan (repo/name or local path)")]
    pub chart: String,

    #[arg(long, help = "Enable JSON output")]
    pub json: bool,

    #[arg(long, help = "Enable debug logging and verbose scanner output")]
    pub debug: bool,

    #[arg(
        long = "no-pull",
        visible_alias = "nopull",
        help = "Don't pull the latest scanner image"
    )]
    pub no_pull: bool,

    #[arg(
        long,
        visible_alias = "trivyargs",
        value_name = "ARGS",
        default_value = "",
        allow_hyphen_values = true,
        help = "CLI args to pass through to the scanner"
    )]
    pub scanner_args: String,

    #[arg(
        long,
        value_name = "SUBCOMMAND",
        help = "Scanner subcommand placed before all scanner flags (use 'image' for current Trivy)"
    )]
    pub scanner_subcommand: Option<String>,

    #[arg(
        long,
        visible_alias = "trivyuser",
        value_name = "USER",
        default_value = DEFAULT_SCAN_USER,
        help = "User to run the scanner as"
    )]
    pub scan_user: String,

    #[arg(
        long,
        visible_alias = "dockeruser",
        value_name = "USERNAME",
        help = "Registry auth username"
    )]
    pub registry_username: Option<String>,

    #[arg(
        long,
        visible_alias = "dockerpass",
        value_name = "PASSWORD",
        help = "Registry auth password"
    )]
    pub registry_password: Option<String>,

    #[arg(
        long,
        value_name = "VALUES",
        help = "Values to set for the chart, format: 'key1=value1,key2=value2'"
    )]
    pub set: Option<String>,

    #[arg(
        long,
        value_name = "FILE_OR_URL",
        help = "Chart values in a YAML file or a URL"
    )]
    pub values: Option<String>,

    #[arg(long, value_name = "VERSION", help = "Chart version constraint")]
    pub chart_version: Option<String>,

    #[arg(
        long,
        visible_alias = "cachedir",
        value_name = "DIR",
        help = "Vulnerability DB cache dir; a temporary dir is used if empty"
    )]
    pub cache_dir: Option<String>,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    pub fn chart_reference(&self) -> ChartReference {
        ChartReference::with_params(
            self.chart.clone(),
            RenderParams {
                set: self.set.clone(),
                values: self.values.clone(),
                version: self.chart_version.clone(),
            },
        )
    }

    /// Layers the flags over `base` (usually loaded from the environment)
    pub fn scan_config(&self, base: ScanConfig) -> ScanConfig {
        let credentials = match (&self.registry_username, &self.registry_password) {
            (None, None) => None,
            (user, pass) => Some(RegistryCredentials::new(
                user.clone().unwrap_or_default(),
                pass.clone().unwrap_or_default(),
            )),
        };

        let scanner_subcommand = self
            .scanner_subcommand
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| base.scanner_subcommand.clone());

        ScanConfig {
            scanner_subcommand,
            output_mode: if self.json {
                OutputMode::Json
            } else {
                OutputMode::Human
            },
            debug: self.debug,
            skip_pull: self.no_pull,
            scanner_args: self.scanner_args.clone(),
            scan_user: self.scan_user.clone(),
            credentials,
            cache_dir: self
                .cache_dir
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            ..base
        }
    }
}
