use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the solver client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the solver service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoint paths, relative to the base URL
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Directory holding the persisted request and result
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// File name offered for the exported report
    #[serde(default = "default_report_file_name")]
    pub report_file_name: String,

    /// How long temporary export resources live after delivery (ms)
    #[serde(default = "default_cleanup_grace_ms")]
    pub cleanup_grace_ms: u64,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String { "http://127.0.0.1:8000".to_string() }
fn default_storage_dir() -> PathBuf { PathBuf::from(".lpform") }
fn default_report_file_name() -> String { "simplex_report.pdf".to_string() }
fn default_cleanup_grace_ms() -> u64 { 200 }
fn default_timeout_secs() -> u64 { 120 }

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_solve_path")]
    pub solve: String,
    #[serde(default = "default_graph_path")]
    pub graph: String,
    #[serde(default = "default_report_path")]
    pub report: String,
}

fn default_solve_path() -> String { "/simplex/solve-tabular".to_string() }
fn default_graph_path() -> String { "/simplex/generate-graph-html".to_string() }
fn default_report_path() -> String { "/simplex/generate-pdf".to_string() }

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            solve: default_solve_path(),
            graph: default_graph_path(),
            report: default_report_path(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoints: Endpoints::default(),
            storage_dir: default_storage_dir(),
            report_file_name: default_report_file_name(),
            cleanup_grace_ms: default_cleanup_grace_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_millis(self.cleanup_grace_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
