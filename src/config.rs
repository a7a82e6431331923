//! Configuration for chartscan
//!
//! A single immutable [`ScanConfig`] is assembled at startup and handed to every
//! component. Defaults come from environment variables, command-line flags are
//! layered on top by the binary.
//!
//! # Environment Variables
//!
//! - `CHARTSCAN_SCANNER_IMAGE`: scanner image - default: "aquasec/trivy:latest"
//! - `CHARTSCAN_RENDER_TOOL`: chart render tool - default: "helm"
//! - `CHARTSCAN_SCANNER_SUBCOMMAND`: subcommand placed before scanner flags
//!   (e.g. "image" for recent Trivy releases) - default: none
//! - `CHARTSCAN_LOG_LEVEL`: logging level - default: "info"
//! - `CHARTSCAN_LOG_JSON`: JSON log lines (true|false) - default: "false"
//!
//! Docker connection settings (`DOCKER_HOST` and friends) are read by bollard.

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SCANNER_IMAGE: &str = "aquasec/trivy:latest";
pub const DEFAULT_RENDER_TOOL: &str = "helm";
pub const DEFAULT_SCAN_USER: &str = "1000";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Scanner image must not be empty")]
    EmptyScannerImage,

    #[error("Render tool must not be empty")]
    EmptyRenderTool,

    #[error("Scan user must not be empty")]
    EmptyScanUser,

    #[error("A registry password was given without a registry username")]
    PasswordWithoutUsername,
}

/// How scanner output is requested and combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Plain-text reports, streamed per image
    #[default]
    Human,
    /// One JSON array per image, spliced into a single array
    Json,
}

/// Registry credentials handed to the scanner
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings shared by every stage of a chart scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Image the scanner containers are created from
    pub scanner_image: String,

    /// Executable used to render the chart
    pub render_tool: String,

    /// Optional scanner subcommand placed before every other scanner argument
    pub scanner_subcommand: Option<String>,

    pub output_mode: OutputMode,

    /// Verbose scanner output instead of quiet
    pub debug: bool,

    /// Skip pulling the latest scanner image before scanning
    pub skip_pull: bool,

    /// Extra arguments passed through to the scanner, split on whitespace
    pub scanner_args: String,

    /// User the scanner container runs as
    pub scan_user: String,

    pub credentials: Option<RegistryCredentials>,

    /// Caller-supplied vulnerability cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    /// Loads defaults from `CHARTSCAN_*` environment variables
    fn default() -> Self {
        let scanner_image = env::var("CHARTSCAN_SCANNER_IMAGE")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SCANNER_IMAGE.to_string());

        let render_tool = env::var("CHARTSCAN_RENDER_TOOL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_RENDER_TOOL.to_string());

        let scanner_subcommand = env::var("CHARTSCAN_SCANNER_SUBCOMMAND")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            scanner_image,
            render_tool,
            scanner_subcommand,
            output_mode: OutputMode::Human,
            debug: false,
            skip_pull: false,
            scanner_args: String::new(),
            scan_user: DEFAULT_SCAN_USER.to_string(),
            credentials: None,
            cache_dir: None,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner_image.trim().is_empty() {
            return Err(ConfigError::EmptyScannerImage);
        }
        if self.render_tool.trim().is_empty() {
            return Err(ConfigError::EmptyRenderTool);
        }
        if self.scan_user.trim().is_empty() {
            return Err(ConfigError::EmptyScanUser);
        }
        if let Some(creds) = &self.credentials {
            if creds.username.is_empty() && !creds.password.is_empty() {
                return Err(ConfigError::PasswordWithoutUsername);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("CHARTSCAN_SCANNER_IMAGE");
        env::remove_var("CHARTSCAN_RENDER_TOOL");
        env::remove_var("CHARTSCAN_SCANNER_SUBCOMMAND");
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = ScanConfig::default();
        assert_eq!(config.scanner_image, DEFAULT_SCANNER_IMAGE);
        assert_eq!(config.render_tool, DEFAULT_RENDER_TOOL);
        assert_eq!(config.scan_user, "1000");
        assert_eq!(config.output_mode, OutputMode::Human);
        assert!(config.scanner_subcommand.is_none());
        assert!(config.credentials.is_none());
        assert!(config.cache_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("CHARTSCAN_SCANNER_IMAGE", "registry.local/trivy:0.50.0");
        env::set_var("CHARTSCAN_RENDER_TOOL", "/opt/helm3/helm");
        env::set_var("CHARTSCAN_SCANNER_SUBCOMMAND", "image");

        let config = ScanConfig::default();
        assert_eq!(config.scanner_image, "registry.local/trivy:0.50.0");
        assert_eq!(config.render_tool, "/opt/helm3/helm");
        assert_eq!(config.scanner_subcommand.as_deref(), Some("image"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_subcommand_is_ignored() {
        clear_env();
        env::set_var("CHARTSCAN_SCANNER_SUBCOMMAND", "  ");
        assert!(ScanConfig::default().scanner_subcommand.is_none());
        clear_env();
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let base = ScanConfig {
            scanner_image: "aquasec/trivy".to_string(),
            render_tool: "helm".to_string(),
            ..ScanConfig::default()
        };

        let config = ScanConfig {
            scanner_image: " ".to_string(),
            ..base.clone()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyScannerImage));

        let config = ScanConfig {
            render_tool: String::new(),
            ..base.clone()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyRenderTool));

        let config = ScanConfig {
            scan_user: String::new(),
            ..base
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyScanUser));
    }

    #[test]
    fn test_validate_password_without_username() {
        let config = ScanConfig {
            scanner_image: "aquasec/trivy".to_string(),
            render_tool: "helm".to_string(),
            credentials: Some(RegistryCredentials::new("", "hunter2")),
            ..ScanConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PasswordWithoutUsername));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = RegistryCredentials::new("robot", "s3cr3t");
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("robot"));
        assert!(!debug_str.contains("s3cr3t"));

        let config = ScanConfig {
            credentials: Some(creds),
            ..ScanConfig::default()
        };
        assert!(!format!("{:?}", config).contains("s3cr3t"));
    }
}
