// Configuration types module
// Defines all configuration-related data structures

use crate::assets::error::{AssetError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level written: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Asset pipeline configuration, fixed for the process lifetime
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Build assets on demand instead of serving a manifest
    pub compile: bool,
    /// Run the css/js compressors
    pub compress: bool,
    /// Source directories, searched in order
    pub paths: Vec<PathBuf>,
    /// Output and manifest directory
    pub build_dir: Option<PathBuf>,
    /// Keep one compiled manifest for the whole process
    pub flush: bool,
    /// Write `.gz` variants next to compiled outputs
    pub gzip: bool,
    /// Glob patterns of logical paths built eagerly
    pub precompile: Vec<String>,
    /// URL prefix of generated tags
    pub serve_path: String,
    /// URL prefix stripped from incoming requests
    pub local_serve_path: String,
    /// Tag helper emits bundled output instead of one tag per file
    pub build: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            compile: true,
            compress: false,
            paths: Vec::new(),
            build_dir: None,
            flush: false,
            gzip: false,
            precompile: Vec::new(),
            serve_path: "assets".to_string(),
            local_serve_path: "assets".to_string(),
            build: false,
        }
    }
}

impl AssetsConfig {
    /// Reject option combinations no resolver can serve
    pub fn validate(&self) -> Result<()> {
        if !self.compile && self.build_dir.is_none() {
            return Err(AssetError::Config(
                "build_dir is required when compile is disabled".to_string(),
            ));
        }
        if self.compile && self.paths.is_empty() {
            return Err(AssetError::Config(
                "paths must name at least one source directory when compile is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
