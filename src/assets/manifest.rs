//! Precompiled asset manifest
//!
//! The manifest indexes compiled outputs in `<build_dir>/manifest.json`:
//! `assets` maps logical paths to their fingerprinted output, `files` maps
//! output filenames back to metadata.

use super::error::{AssetError, Result};
use super::path::inject_digest;
use crate::compiler::Environment;
use crate::logger;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Serialized manifest contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestData {
    #[serde(default)]
    pub assets: BTreeMap<String, ManifestAsset>,
    #[serde(default)]
    pub files: BTreeMap<String, ManifestFile>,
}

/// Metadata for a logical asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub digest: String,
    /// Output file relative to the build directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default = "epoch")]
    pub mtime: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
}

impl ManifestAsset {
    /// Output file, defaulting to the fingerprinted logical path
    pub fn output_file(&self, logical_path: &str) -> String {
        self.file
            .clone()
            .unwrap_or_else(|| inject_digest(logical_path, &self.digest))
    }
}

/// Metadata for a compiled output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub logical_path: String,
    pub digest: String,
    #[serde(default = "epoch")]
    pub mtime: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
}

const fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Manifest bound to a build directory
#[derive(Debug, Clone)]
pub struct Manifest {
    dir: PathBuf,
    data: ManifestData,
}

impl Manifest {
    /// Empty manifest for `dir`; nothing is read
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            data: ManifestData::default(),
        }
    }

    /// Manifest for `dir`, loaded from disk when the file exists
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest = Self::new(dir);
        if manifest.exists() {
            manifest.data = manifest.load()?;
        } else {
            logger::log_warning(&format!(
                "Manifest '{}' not found, no assets will resolve",
                manifest.path().display()
            ));
        }
        Ok(manifest)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub const fn data(&self) -> &ManifestData {
        &self.data
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Read the manifest file as-is
    pub fn load(&self) -> Result<ManifestData> {
        let path = self.path();
        let raw = fs::read(&path).map_err(|e| AssetError::io(&path, e))?;
        serde_json::from_slice(&raw).map_err(|source| AssetError::Manifest { path, source })
    }

    /// Compile every logical path matching `patterns` into the build directory
    ///
    /// Writes fingerprinted outputs, `.gz` siblings when `gzip` is set, and
    /// the manifest file itself.
    pub fn compile(
        &mut self,
        env: &Environment,
        patterns: &[String],
        gzip: bool,
    ) -> Result<ManifestData> {
        let mut data = ManifestData::default();

        for logical_path in env.each_logical_path(patterns)? {
            let Some(asset) = env.find_asset(&logical_path, true)? else {
                continue;
            };
            let body = asset.read_body_blocking()?;
            let file = inject_digest(&logical_path, &asset.digest);
            let target = self.dir.join(&file);
            write_file(&target, &body)?;
            if gzip {
                write_file(&gz_path(&target), &gzip_bytes(&body, &target)?)?;
            }

            let size = body.len() as u64;
            data.assets.insert(
                logical_path.clone(),
                ManifestAsset {
                    digest: asset.digest.clone(),
                    file: Some(file.clone()),
                    mtime: asset.mtime,
                    size,
                },
            );
            data.files.insert(
                file,
                ManifestFile {
                    logical_path,
                    digest: asset.digest,
                    mtime: asset.mtime,
                    size,
                },
            );
        }

        self.save(&data)?;
        self.data = data.clone();
        Ok(data)
    }

    fn save(&self, data: &ManifestData) -> Result<()> {
        let path = self.path();
        let json = serde_json::to_vec_pretty(data).map_err(|source| AssetError::Manifest {
            path: path.clone(),
            source,
        })?;
        write_file(&path, &json)
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }
    }
    fs::write(path, content).map_err(|e| AssetError::io(path, e))
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

fn gzip_bytes(content: &[u8], target: &Path) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(content)
        .map_err(|e| AssetError::io(target, e))?;
    encoder.finish().map_err(|e| AssetError::io(target, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_entry() {
        let json = r#"{"assets":{"app.js":{"digest":"abcd"}}}"#;
        let data: ManifestData = serde_json::from_str(json).unwrap();
        let entry = &data.assets["app.js"];
        assert_eq!(entry.digest, "abcd");
        assert_eq!(entry.size, 0);
        assert_eq!(entry.mtime, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(entry.output_file("app.js"), "app-abcd.js");
        assert!(data.files.is_empty());
    }

    #[test]
    fn test_open_missing_and_malformed() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::open(dir.path()).unwrap();
        assert!(manifest.data().assets.is_empty());

        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        assert!(matches!(
            Manifest::open(dir.path()),
            Err(AssetError::Manifest { .. })
        ));
    }

    #[test]
    fn test_compile_writes_outputs() {
        let src = TempDir::new().unwrap();
        let build = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("js")).unwrap();
        fs::write(src.path().join("js/app.js"), "var a;\n").unwrap();
        fs::write(src.path().join("skip.txt"), "nope").unwrap();

        let mut env = Environment::new();
        env.append_path(src.path());
        let mut manifest = Manifest::new(build.path());
        let data = manifest
            .compile(&env, &["*.js".to_string()], true)
            .unwrap();

        let entry = &data.assets["js/app.js"];
        let file = entry.file.clone().unwrap();
        assert_eq!(file, format!("js/app-{}.js", entry.digest));
        assert_eq!(entry.size, 7);
        assert_eq!(data.files[&file].logical_path, "js/app.js");
        assert!(!data.assets.contains_key("skip.txt"));

        assert_eq!(fs::read(build.path().join(&file)).unwrap(), b"var a;\n");
        let gz = fs::read(build.path().join(format!("{file}.gz"))).unwrap();
        let mut unzipped = String::new();
        GzDecoder::new(&gz[..]).read_to_string(&mut unzipped).unwrap();
        assert_eq!(unzipped, "var a;\n");

        // Persisted manifest matches the returned data
        assert_eq!(manifest.load().unwrap(), data);
        assert_eq!(manifest.data(), &data);
    }
}
