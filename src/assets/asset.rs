//! Resolved asset model

use super::error::{AssetError, Result};
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use std::path::PathBuf;

/// Length of a digest in hex characters
pub const DIGEST_LEN: usize = 32;

/// Where the bytes of an asset live
#[derive(Debug, Clone)]
pub enum AssetBody {
    /// Compiled in memory by the live compiler
    Memory(Bytes),
    /// Prebuilt file in the build directory, read on every request
    File(PathBuf),
}

/// Single file or ordered bundle of constituents
#[derive(Debug, Clone, Default)]
pub enum AssetKind {
    #[default]
    Single,
    Bundled(Vec<Asset>),
}

/// A compiled asset, immutable once returned by a resolver
#[derive(Debug, Clone)]
pub struct Asset {
    pub logical_path: String,
    pub digest: String,
    /// Bare content type, without charset; may be empty
    pub content_type: String,
    pub mtime: DateTime<Utc>,
    pub body: AssetBody,
    pub kind: AssetKind,
}

impl Asset {
    pub const fn is_bundle(&self) -> bool {
        matches!(self.kind, AssetKind::Bundled(_))
    }

    /// Constituents of a bundle in order, or the asset itself
    pub fn to_array(&self) -> Vec<&Self> {
        match &self.kind {
            AssetKind::Bundled(parts) => parts.iter().collect(),
            AssetKind::Single => vec![self],
        }
    }

    /// Load the full content
    pub async fn read_body(&self) -> Result<Bytes> {
        match &self.body {
            AssetBody::Memory(bytes) => Ok(bytes.clone()),
            AssetBody::File(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| AssetError::io(path, e)),
        }
    }

    /// Load the full content from a blocking context
    pub fn read_body_blocking(&self) -> Result<Bytes> {
        match &self.body {
            AssetBody::Memory(bytes) => Ok(bytes.clone()),
            AssetBody::File(path) => std::fs::read(path)
                .map(Bytes::from)
                .map_err(|e| AssetError::io(path, e)),
        }
    }
}

/// Content digest: leading 128 bits of BLAKE3, hex encoded
pub fn compute_digest(content: &[u8]) -> String {
    let hash = blake3::hash(content);
    hex::encode(&hash.as_bytes()[..DIGEST_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(path: &str, body: &str) -> Asset {
        Asset {
            logical_path: path.to_string(),
            digest: compute_digest(body.as_bytes()),
            content_type: "text/javascript".to_string(),
            mtime: DateTime::<Utc>::UNIX_EPOCH,
            body: AssetBody::Memory(Bytes::from(body.to_string())),
            kind: AssetKind::Single,
        }
    }

    #[test]
    fn test_digest_shape() {
        let digest = compute_digest(b"console.log(1);");
        assert_eq!(digest.len(), DIGEST_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(digest, compute_digest(b"console.log(1);"));
        assert_ne!(digest, compute_digest(b"console.log(2);"));
    }

    #[test]
    fn test_to_array() {
        let lone = single("a.js", "a");
        assert_eq!(lone.to_array().len(), 1);
        assert!(!lone.is_bundle());

        let mut bundle = single("app.js", "a\nb");
        bundle.kind = AssetKind::Bundled(vec![single("a.js", "a"), single("app.js", "b")]);
        let parts: Vec<_> = bundle.to_array().iter().map(|a| a.logical_path.clone()).collect();
        assert_eq!(parts, vec!["a.js", "app.js"]);
    }

    #[tokio::test]
    async fn test_read_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        std::fs::write(&path, "x").unwrap();

        let mut asset = single("app.js", "x");
        asset.body = AssetBody::File(path);
        assert_eq!(asset.read_body().await.unwrap(), Bytes::from("x"));

        asset.body = AssetBody::File(dir.path().join("missing.js"));
        assert!(matches!(asset.read_body().await, Err(AssetError::Io { .. })));
    }
}
