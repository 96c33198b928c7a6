//! Configuration file support
//!
//! Reads from egg-report.toml in the working directory (or any ancestor).
//! Everything has a default; the file is optional.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Upload server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Export artifact settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Upload server settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Port the upload form listens on
    /// Default: 8000
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory where uploads and export artifacts are written
    /// Default: "uploads"
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

/// Export artifact settings
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ExportConfig {
    /// Whether the downloadable artifacts carry the source-file column
    /// Default: false (the display table never shows it either way)
    #[serde(default)]
    pub include_source: bool,
}

fn default_port() -> u16 {
    8000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl Config {
    /// Load config from egg-report.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&contents) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Find egg-report.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join("egg-report.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Well-known path of the Excel artifact, overwritten per request.
    pub fn xlsx_artifact(&self) -> PathBuf {
        self.server.upload_dir.join("parsed_data.xlsx")
    }

    /// Well-known path of the CSV artifact, overwritten per request.
    pub fn csv_artifact(&self) -> PathBuf {
        self.server.upload_dir.join("parsed_data.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
        assert!(!config.export.include_source);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 9000
upload_dir = "/tmp/egg-uploads"

[export]
include_source = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.upload_dir, PathBuf::from("/tmp/egg-uploads"));
        assert!(config.export.include_source);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[server]
port = 3100
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3100);
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
        assert!(!config.export.include_source);
    }

    #[test]
    fn test_artifact_paths() {
        let config = Config::default();
        assert_eq!(
            config.xlsx_artifact(),
            PathBuf::from("uploads/parsed_data.xlsx")
        );
        assert_eq!(
            config.csv_artifact(),
            PathBuf::from("uploads/parsed_data.csv")
        );
    }
}
