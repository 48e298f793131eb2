//! Filesystem asset compiler
//!
//! `Environment` resolves logical paths against an ordered list of source
//! directories, expands `require` directives into bundles, rewrites
//! `asset-url(...)` references in stylesheets and runs the registered
//! compressors. Compiled assets are cached until one of their source files
//! changes on disk.

pub mod compressor;
pub mod directive;

use crate::assets::asset::{compute_digest, Asset, AssetBody, AssetKind};
use crate::assets::error::{AssetError, Result};
use crate::assets::path;
use crate::http::mime;
use chrono::{DateTime, Utc};
use compressor::Compressor;
use hyper::body::Bytes;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};
use std::time::SystemTime;
use walkdir::WalkDir;

static ASSET_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"asset-url\(\s*["']?([^"')\s]+)["']?\s*\)"#).expect("asset-url pattern is valid")
});

/// Builds the public URL written for an `asset-url(...)` reference
pub type AssetPathCallback = Box<dyn Fn(&Asset) -> String + Send + Sync>;

type CacheKey = (String, bool);

/// Source files a compiled asset was built from, with their mtimes
type Sources = Vec<(PathBuf, Option<SystemTime>)>;

struct Compiled {
    asset: Asset,
    sources: Sources,
}

/// Asset compilation environment
#[derive(Default)]
pub struct Environment {
    paths: Vec<PathBuf>,
    css_compressor: Option<Box<dyn Compressor>>,
    js_compressor: Option<Box<dyn Compressor>>,
    asset_path: Option<AssetPathCallback>,
    cache: RwLock<HashMap<CacheKey, Compiled>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source directory; earlier directories win
    pub fn append_path(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn set_css_compressor(&mut self, name: &str) -> Result<()> {
        self.css_compressor = Some(compressor::by_name(name)?);
        Ok(())
    }

    pub fn set_js_compressor(&mut self, name: &str) -> Result<()> {
        self.js_compressor = Some(compressor::by_name(name)?);
        Ok(())
    }

    /// Register the callback used to write `asset-url(...)` references
    pub fn register_asset_path<F>(&mut self, callback: F)
    where
        F: Fn(&Asset) -> String + Send + Sync + 'static,
    {
        self.asset_path = Some(Box::new(callback));
    }

    /// Find and compile an asset
    ///
    /// With `bundle` set, required assets are concatenated ahead of the asset
    /// itself and the result is a [`AssetKind::Bundled`] listing every
    /// constituent. Without it, only the asset's own processed body is
    /// returned. `Ok(None)` means no search path contains the file.
    pub fn find_asset(&self, logical_path: &str, bundle: bool) -> Result<Option<Asset>> {
        let key = (logical_path.to_string(), bundle);
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = cache.get(&key) {
                if is_fresh(&hit.sources) {
                    return Ok(Some(hit.asset.clone()));
                }
            }
        }

        let mut stack = Vec::new();
        let Some(compiled) = self.compile(logical_path, bundle, &mut stack)? else {
            return Ok(None);
        };

        let asset = compiled.asset.clone();
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, compiled);
        Ok(Some(asset))
    }

    /// Logical paths under the search paths matching any of `patterns`
    ///
    /// Paths are returned in directory walk order; a logical path shadowed
    /// by an earlier search path is listed once.
    pub fn each_logical_path(&self, patterns: &[String]) -> Result<Vec<String>> {
        let patterns = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| AssetError::InvalidPattern(p.clone(), e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut logical_paths = Vec::new();
        for root in &self.paths {
            let entries = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file());

            for entry in entries {
                let Ok(relative) = entry.path().strip_prefix(root) else {
                    continue;
                };
                let logical = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if patterns.iter().any(|p| p.matches(&logical)) && seen.insert(logical.clone()) {
                    logical_paths.push(logical);
                }
            }
        }

        Ok(logical_paths)
    }

    /// First search path holding `logical_path`
    ///
    /// Only plain relative paths are looked up; anything absolute or with
    /// `.`/`..` components could escape the search roots.
    fn locate(&self, logical_path: &str) -> Option<PathBuf> {
        let relative = Path::new(logical_path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }

        self.paths
            .iter()
            .map(|root| root.join(logical_path))
            .find(|candidate| candidate.is_file())
    }

    fn compile(
        &self,
        logical_path: &str,
        bundle: bool,
        stack: &mut Vec<String>,
    ) -> Result<Option<Compiled>> {
        let Some(file) = self.locate(logical_path) else {
            return Ok(None);
        };
        if stack.iter().any(|p| p == logical_path) {
            return Err(AssetError::CircularDependency(logical_path.to_string()));
        }

        let modified = fs::metadata(&file).and_then(|m| m.modified()).ok();
        let mut sources = vec![(file.clone(), modified)];
        let extension = extension_of(logical_path);
        let raw = fs::read(&file).map_err(|e| AssetError::io(&file, e))?;

        // Only scripts and stylesheets are processed; everything else is copied.
        let text_source = match extension {
            Some("js" | "css") => String::from_utf8(raw).map_err(|e| e.into_bytes()),
            _ => Err(raw),
        };
        let (requires, body) = match text_source {
            Ok(text) => {
                stack.push(logical_path.to_string());
                let processed = self.process(logical_path, extension, &text, stack, &mut sources);
                stack.pop();
                let (requires, body) = processed?;
                (requires, Bytes::from(body))
            }
            Err(bytes) => (Vec::new(), Bytes::from(bytes)),
        };

        let own = Asset {
            logical_path: logical_path.to_string(),
            digest: compute_digest(&body),
            content_type: mime::content_type_for(logical_path).to_string(),
            mtime: to_datetime(modified),
            body: AssetBody::Memory(body),
            kind: AssetKind::Single,
        };

        if !bundle || requires.is_empty() {
            return Ok(Some(Compiled { asset: own, sources }));
        }

        stack.push(logical_path.to_string());
        let parts = self.collect_constituents(logical_path, &requires, stack, &mut sources);
        stack.pop();
        let mut parts = parts?;
        parts.push(own);

        Ok(Some(Compiled {
            asset: concatenate(logical_path, parts),
            sources,
        }))
    }

    /// Strip directives, rewrite references and compress one source file
    fn process(
        &self,
        logical_path: &str,
        extension: Option<&str>,
        text: &str,
        stack: &mut Vec<String>,
        sources: &mut Sources,
    ) -> Result<(Vec<String>, String)> {
        let directives = directive::parse(text);
        let requires = directives
            .requires
            .iter()
            .map(|r| resolve_require(logical_path, r, extension))
            .collect();

        let mut body = directives.body;
        let compressor = match extension {
            Some("css") => {
                body = self.rewrite_asset_urls(logical_path, &body, stack, sources)?;
                self.css_compressor.as_ref()
            }
            Some("js") => self.js_compressor.as_ref(),
            _ => None,
        };
        if let Some(compressor) = compressor {
            body = compressor.compress(&body);
        }

        Ok((requires, body))
    }

    fn rewrite_asset_urls(
        &self,
        logical_path: &str,
        body: &str,
        stack: &mut Vec<String>,
        sources: &mut Sources,
    ) -> Result<String> {
        let mut out = String::with_capacity(body.len());
        let mut last = 0;
        for caps in ASSET_URL.captures_iter(body) {
            let (whole, reference) = match (caps.get(0), caps.get(1)) {
                (Some(w), Some(r)) => (w, r.as_str()),
                _ => continue,
            };
            let Some(target) = self.compile(reference, true, stack)? else {
                return Err(AssetError::MissingDependency {
                    asset: logical_path.to_string(),
                    dependency: reference.to_string(),
                });
            };
            sources.extend(target.sources);

            out.push_str(&body[last..whole.start()]);
            out.push_str(&format!("url(\"{}\")", self.asset_url(&target.asset)));
            last = whole.end();
        }
        out.push_str(&body[last..]);
        Ok(out)
    }

    fn asset_url(&self, asset: &Asset) -> String {
        match &self.asset_path {
            Some(callback) => callback(asset),
            None => path::public_url("", &asset.logical_path, &asset.digest),
        }
    }

    fn collect_constituents(
        &self,
        logical_path: &str,
        requires: &[String],
        stack: &mut Vec<String>,
        sources: &mut Sources,
    ) -> Result<Vec<Asset>> {
        let mut parts: Vec<Asset> = Vec::new();
        for dependency in requires {
            if dependency == logical_path {
                continue;
            }
            let Some(compiled) = self.compile(dependency, true, stack)? else {
                return Err(AssetError::MissingDependency {
                    asset: logical_path.to_string(),
                    dependency: dependency.clone(),
                });
            };
            sources.extend(compiled.sources);

            for part in compiled.asset.to_array() {
                let duplicate = parts.iter().any(|p| p.logical_path == part.logical_path);
                if !duplicate && part.logical_path != logical_path {
                    parts.push(part.clone());
                }
            }
        }
        Ok(parts)
    }
}

/// Concatenate constituents into one bundled asset
fn concatenate(logical_path: &str, parts: Vec<Asset>) -> Asset {
    let mut content = Vec::new();
    let mut mtime = DateTime::<Utc>::UNIX_EPOCH;
    for part in &parts {
        if let AssetBody::Memory(bytes) = &part.body {
            content.extend_from_slice(bytes);
            if !bytes.is_empty() && !bytes.ends_with(b"\n") {
                content.push(b'\n');
            }
        }
        mtime = mtime.max(part.mtime);
    }

    Asset {
        logical_path: logical_path.to_string(),
        digest: compute_digest(&content),
        content_type: mime::content_type_for(logical_path).to_string(),
        mtime,
        body: AssetBody::Memory(Bytes::from(content)),
        kind: AssetKind::Bundled(parts),
    }
}

/// Turn a `require` argument into a logical path
///
/// `./` and `../` are relative to the requiring file; a missing extension
/// is taken from the requiring file.
fn resolve_require(from: &str, required: &str, extension: Option<&str>) -> String {
    let mut resolved = if required.starts_with("./") || required.starts_with("../") {
        let mut segments: Vec<&str> = from.split('/').collect();
        segments.pop();
        for segment in required.split('/') {
            match segment {
                "." | "" => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        segments.join("/")
    } else {
        required.to_string()
    };

    if let Some(ext) = extension {
        if extension_of(&resolved).is_none() {
            resolved.push('.');
            resolved.push_str(ext);
        }
    }
    resolved
}

fn extension_of(logical_path: &str) -> Option<&str> {
    let name = logical_path.rsplit('/').next().unwrap_or(logical_path);
    Path::new(name).extension().and_then(|e| e.to_str())
}

fn to_datetime(modified: Option<SystemTime>) -> DateTime<Utc> {
    modified.map_or(DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::from)
}

fn is_fresh(sources: &Sources) -> bool {
    sources.iter().all(|(file, recorded)| {
        let current = fs::metadata(file).and_then(|m| m.modified()).ok();
        current.is_some() && current == *recorded
    })
}
