//! Asset resolution strategies
//!
//! A resolver is picked once when [`super::Assets`] is built: the live
//! compiler in development, the precompiled manifest in production.

use super::asset::{Asset, AssetBody, AssetKind};
use super::error::{AssetError, Result};
use super::manifest::{Manifest, ManifestData};
use super::path::{public_url, AssetPath};
use crate::compiler::Environment;
use crate::config::AssetsConfig;
use crate::http::mime;
use crate::logger;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Maps logical or fingerprinted paths to compiled assets
pub trait Resolver: Send + Sync {
    /// Look up a logical path; `Ok(None)` is a plain miss
    fn find_asset(&self, logical_path: &str, bundle: bool) -> Result<Option<Asset>>;

    /// Look up the asset behind an incoming request path
    fn resolve_request(&self, path: &AssetPath, bundle: bool) -> Result<Option<Asset>> {
        self.find_asset(&path.logical_path, bundle)
    }

    /// Eager build run once at startup
    fn precompile(&self) -> Result<Option<ManifestData>>;

    /// Where lookups search, for error messages
    fn search_location(&self) -> String;
}

/// Serves a precompiled manifest without a compiler
pub struct ManifestResolver {
    manifest: Manifest,
}

impl ManifestResolver {
    pub fn new(build_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            manifest: Manifest::open(build_dir)?,
        })
    }
}

impl Resolver for ManifestResolver {
    fn find_asset(&self, logical_path: &str, _bundle: bool) -> Result<Option<Asset>> {
        let Some(entry) = self.manifest.data().assets.get(logical_path) else {
            return Ok(None);
        };

        Ok(Some(Asset {
            logical_path: logical_path.to_string(),
            digest: entry.digest.clone(),
            content_type: mime::content_type_for(logical_path).to_string(),
            mtime: entry.mtime,
            body: AssetBody::File(self.manifest.dir().join(entry.output_file(logical_path))),
            kind: AssetKind::Single,
        }))
    }

    fn precompile(&self) -> Result<Option<ManifestData>> {
        Ok(None)
    }

    fn search_location(&self) -> String {
        format!("manifest:\n    {}", self.manifest.path().display())
    }
}

/// Compiles assets on demand, optionally persisting a manifest
pub struct LiveCompilerResolver {
    env: Environment,
    manifest: Option<Mutex<Manifest>>,
    flush: bool,
    gzip: bool,
    precompile: Vec<String>,
    /// Manifest cached by a flush-mode eager build, set at most once
    flushed: OnceLock<ManifestData>,
}

impl LiveCompilerResolver {
    pub fn new(options: &AssetsConfig) -> Result<Self> {
        let mut env = Environment::new();
        for path in &options.paths {
            env.append_path(path);
        }
        if options.compress {
            env.set_css_compressor("css-minify")?;
            env.set_js_compressor("js-strip")?;
        }

        let serve_path = options.serve_path.clone();
        env.register_asset_path(move |asset| {
            public_url(&serve_path, &asset.logical_path, &asset.digest)
        });

        let manifest = options
            .build_dir
            .as_ref()
            .map(|dir| Mutex::new(Manifest::new(dir)));
        if options.flush && manifest.is_none() {
            logger::log_warning("assets.flush has no effect without assets.build_dir");
        }

        Ok(Self {
            flush: options.flush && manifest.is_some(),
            env,
            manifest,
            gzip: options.gzip,
            precompile: options.precompile.clone(),
            flushed: OnceLock::new(),
        })
    }

    pub const fn environment(&self) -> &Environment {
        &self.env
    }

    fn build_manifest(&self, manifest: &Mutex<Manifest>) -> Result<ManifestData> {
        let mut manifest = manifest.lock().unwrap_or_else(PoisonError::into_inner);

        if self.flush && manifest.exists() {
            logger::log_info(&format!(
                "[Assets] Reusing manifest {}",
                manifest.path().display()
            ));
            return manifest.load();
        }

        let data = manifest.compile(&self.env, &self.precompile, self.gzip)?;
        logger::log_info(&format!(
            "[Assets] Compiled {} assets into {}",
            data.assets.len(),
            manifest.dir().display()
        ));
        Ok(data)
    }

    fn build_dir(&self) -> Option<PathBuf> {
        self.manifest.as_ref().map(|m| {
            m.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .dir()
                .to_path_buf()
        })
    }
}

impl Resolver for LiveCompilerResolver {
    fn find_asset(&self, logical_path: &str, bundle: bool) -> Result<Option<Asset>> {
        self.env.find_asset(logical_path, bundle)
    }

    fn resolve_request(&self, path: &AssetPath, bundle: bool) -> Result<Option<Asset>> {
        if !self.flush {
            return self.find_asset(&path.logical_path, bundle);
        }

        let data = self.flushed.get().ok_or(AssetError::ManifestNotLoaded)?;
        let (key, file) = match data.files.get_key_value(path.requested.as_str()) {
            Some(hit) => hit,
            None => match data.files.get_key_value(path.resource()) {
                Some(hit) => hit,
                None => return Ok(None),
            },
        };
        let Some(build_dir) = self.build_dir() else {
            return Ok(None);
        };

        Ok(Some(Asset {
            logical_path: file.logical_path.clone(),
            digest: file.digest.clone(),
            content_type: mime::output_content_type(key).to_string(),
            mtime: file.mtime,
            body: AssetBody::File(build_dir.join(key)),
            kind: AssetKind::Single,
        }))
    }

    fn precompile(&self) -> Result<Option<ManifestData>> {
        let Some(manifest) = &self.manifest else {
            // Errors surface again on first real lookup
            let logical_paths = self.env.each_logical_path(&self.precompile)?;
            for logical_path in &logical_paths {
                let _ = self.env.find_asset(logical_path, true);
            }
            logger::log_info(&format!(
                "[Assets] Warmed {} assets",
                logical_paths.len()
            ));
            return Ok(None);
        };

        let data = self.build_manifest(manifest)?;
        if self.flush && self.flushed.set(data.clone()).is_err() {
            logger::log_warning("Asset manifest already cached, keeping the first build");
        }
        Ok(Some(data))
    }

    fn search_location(&self) -> String {
        let paths = self
            .env
            .paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n    ");
        format!("search path:\n    {paths}")
    }
}
