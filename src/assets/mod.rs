//! Fingerprinted asset pipeline
//!
//! [`Assets`] owns the resolver chosen from configuration and exposes the
//! three operations the rest of the server needs: the eager build, request
//! lookups for the HTTP responder and the template tag helper.

pub mod asset;
pub mod error;
pub mod helper;
pub mod manifest;
pub mod path;
pub mod resolver;

pub use asset::{Asset, AssetBody, AssetKind};
pub use error::{AssetError, Result};
pub use helper::{parse_attributes, script_tag, stylesheet_tag};
pub use manifest::{Manifest, ManifestData};
pub use path::AssetPath;
pub use resolver::{LiveCompilerResolver, ManifestResolver, Resolver};

use crate::config::AssetsConfig;
use std::sync::Arc;

/// Asset pipeline bound to one configuration
pub struct Assets {
    options: AssetsConfig,
    resolver: Box<dyn Resolver>,
}

impl Assets {
    /// Validate `options` and pick the resolution strategy
    pub fn new(options: AssetsConfig) -> Result<Self> {
        options.validate()?;

        // validate guarantees a build_dir whenever compile is off
        let resolver: Box<dyn Resolver> = match &options.build_dir {
            Some(build_dir) if !options.compile => Box::new(ManifestResolver::new(build_dir)?),
            _ => Box::new(LiveCompilerResolver::new(&options)?),
        };

        Ok(Self { options, resolver })
    }

    /// Use a custom resolver
    pub fn with_resolver(options: AssetsConfig, resolver: Box<dyn Resolver>) -> Self {
        Self { options, resolver }
    }

    pub const fn options(&self) -> &AssetsConfig {
        &self.options
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// Eager build, run on the calling thread
    ///
    /// A no-op outside compile mode.
    pub fn precompile(&self) -> Result<Option<ManifestData>> {
        if !self.options.compile {
            return Ok(None);
        }
        self.resolver.precompile()
    }

    /// Eager build on the blocking pool; resolves once all I/O has settled
    pub async fn compile(self: Arc<Self>) -> Result<Option<ManifestData>> {
        tokio::task::spawn_blocking(move || self.precompile())
            .await
            .map_err(|e| AssetError::Task(e.to_string()))?
    }

    /// Resolve a parsed request path, bundling per the `build` option
    pub fn lookup(&self, path: &AssetPath) -> Result<Option<Asset>> {
        self.resolver.resolve_request(path, self.options.build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_selects_resolver() {
        let build = TempDir::new().unwrap();
        let manifest_mode = AssetsConfig {
            compile: false,
            build_dir: Some(build.path().to_path_buf()),
            ..AssetsConfig::default()
        };
        let assets = Assets::new(manifest_mode).unwrap();
        assert!(assets.resolver().search_location().starts_with("manifest:"));

        let src = TempDir::new().unwrap();
        let compile_mode = AssetsConfig {
            paths: vec![src.path().to_path_buf()],
            ..AssetsConfig::default()
        };
        let assets = Assets::new(compile_mode).unwrap();
        assert!(assets.resolver().search_location().starts_with("search path:"));
    }

    #[test]
    fn test_new_rejects_manifest_mode_without_build_dir() {
        let options = AssetsConfig {
            compile: false,
            ..AssetsConfig::default()
        };
        assert!(matches!(Assets::new(options), Err(AssetError::Config(_))));
    }

    #[tokio::test]
    async fn test_compile_is_noop_in_manifest_mode() {
        let build = TempDir::new().unwrap();
        let assets = Arc::new(
            Assets::new(AssetsConfig {
                compile: false,
                build_dir: Some(build.path().to_path_buf()),
                ..AssetsConfig::default()
            })
            .unwrap(),
        );
        assert!(assets.compile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_compile_builds_manifest() {
        let src = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::write(src.path().join("app.js"), "app\n").unwrap();
        let assets = Arc::new(
            Assets::new(AssetsConfig {
                paths: vec![src.path().to_path_buf()],
                build_dir: Some(build.path().to_path_buf()),
                precompile: vec!["app.js".to_string()],
                flush: true,
                ..AssetsConfig::default()
            })
            .unwrap(),
        );

        let data = Arc::clone(&assets).compile().await.unwrap().unwrap();
        let digest = data.assets["app.js"].digest.clone();

        let hit = assets
            .lookup(&AssetPath::parse(&format!("app-{digest}.js")))
            .unwrap();
        assert_eq!(hit.map(|a| a.digest), Some(digest));
    }
}
