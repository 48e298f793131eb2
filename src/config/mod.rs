// Configuration module entry point
// Loads server, logging and asset pipeline settings once at startup

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{AssetsConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file, resolved without extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default `config.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Environment variables prefixed `ASSET_SERVER` override the file,
    /// with `__` separating tables, e.g. `ASSET_SERVER_ASSETS__COMPILE=false`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("ASSET_SERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path().join("absent").to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.assets.compile);
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_load_assets_table() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("assets.toml");
        fs::write(
            &file,
            r#"
[server]
port = 9000

[assets]
compile = false
build_dir = "public/assets"
serve_path = "//cdn.example.com/assets"
precompile = ["*.js", "*.css"]
build = true
"#,
        )
        .unwrap();

        let cfg = Config::load_from(file.with_extension("").to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert!(!cfg.assets.compile);
        assert!(cfg.assets.build);
        assert_eq!(
            cfg.assets.build_dir.as_deref(),
            Some(std::path::Path::new("public/assets"))
        );
        assert_eq!(cfg.assets.precompile, vec!["*.js", "*.css"]);
        assert_eq!(cfg.assets.local_serve_path, "assets");
    }
}
