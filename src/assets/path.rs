//! Fingerprinted asset paths
//!
//! Served filenames follow `<logical-name>-<digest><extension>`, where the
//! digest is 32 to 40 lowercase hex characters. This module parses that form
//! back into a logical path and composes it for generated URLs.

use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;

static FINGERPRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-([0-9a-f]{32,40})(\.[^.]+)$").expect("fingerprint pattern is valid")
});

/// A request path split into its logical path and optional fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    /// Digest embedded in the filename, if any
    pub fingerprint: Option<String>,
    /// Path with the fingerprint removed, extension kept
    pub logical_path: String,
    /// The path exactly as requested
    pub requested: String,
}

impl AssetPath {
    /// Split `path` into logical path and fingerprint
    ///
    /// # Examples
    /// ```
    /// use asset_server::assets::path::AssetPath;
    /// let digest = "0123456789abcdef0123456789abcdef";
    /// let parsed = AssetPath::parse(&format!("js/app-{digest}.js"));
    /// assert_eq!(parsed.logical_path, "js/app.js");
    /// assert_eq!(parsed.fingerprint.as_deref(), Some(digest));
    /// ```
    pub fn parse(path: &str) -> Self {
        match FINGERPRINT.captures(path) {
            Some(caps) => {
                let whole = caps.get(0).map_or(path.len(), |m| m.start());
                let ext = caps.get(2).map_or("", |m| m.as_str());
                Self {
                    fingerprint: caps.get(1).map(|m| m.as_str().to_string()),
                    logical_path: format!("{}{ext}", &path[..whole]),
                    requested: path.to_string(),
                }
            }
            None => Self {
                fingerprint: None,
                logical_path: path.to_string(),
                requested: path.to_string(),
            },
        }
    }

    /// Trailing filename component of the requested path
    pub fn resource(&self) -> &str {
        self.requested
            .rsplit('/')
            .next()
            .unwrap_or(&self.requested)
    }
}

/// Reject directory traversal, absolute paths and NUL injection
///
/// Expects a decoded path with the mount and leading slashes already
/// stripped, so a remaining leading `/` came from an encoded `%2F`.
pub fn is_invalid_path(path: &str) -> bool {
    path.starts_with('/') || path.contains("..") || path.contains('\0')
}

/// Whether a serve path is already an absolute or protocol-relative URL
pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http") || path.starts_with("//")
}

/// Strip the mount prefix and leading slashes from a URL path
///
/// Returns `None` when the path lies outside the mount.
pub fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<&'a str> {
    let path = path.trim_start_matches('/');
    let mount = mount.trim_matches('/');
    if mount.is_empty() {
        return Some(path);
    }

    let rest = path.strip_prefix(mount)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest.trim_start_matches('/'))
    } else {
        None
    }
}

/// Percent-decode a URL path; `None` when the result is not UTF-8
pub fn decode(path: &str) -> Option<String> {
    percent_decode_str(path)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Insert `-<digest>` before the final extension of the last path segment
///
/// A segment without an extension is returned unchanged.
pub fn inject_digest(path: &str, digest: &str) -> String {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].rfind('.') {
        Some(dot) => {
            let dot = segment_start + dot;
            format!("{}-{digest}{}", &path[..dot], &path[dot..])
        }
        None => path.to_string(),
    }
}

/// Public, fingerprinted URL of an asset under `serve_path`
pub fn public_url(serve_path: &str, logical_path: &str, digest: &str) -> String {
    let base = serve_path.trim_end_matches('/');
    let path = if base.is_empty() {
        logical_path.to_string()
    } else {
        format!("{base}/{logical_path}")
    };

    let path = if is_absolute_url(serve_path) {
        path
    } else {
        format!("/{}", path.trim_start_matches('/'))
    };

    inject_digest(&path, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(len: usize) -> String {
        "0123456789abcdef".chars().cycle().take(len).collect()
    }

    #[test]
    fn test_parse_fingerprint_bounds() {
        for len in [32, 36, 40] {
            let digest = hex(len);
            let parsed = AssetPath::parse(&format!("app-{digest}.js"));
            assert_eq!(parsed.fingerprint, Some(digest));
            assert_eq!(parsed.logical_path, "app.js");
        }

        for len in [31, 41] {
            let path = format!("app-{}.js", hex(len));
            let parsed = AssetPath::parse(&path);
            assert_eq!(parsed.fingerprint, None);
            assert_eq!(parsed.logical_path, path);
        }
    }

    #[test]
    fn test_parse_without_fingerprint() {
        let parsed = AssetPath::parse("css/site.css");
        assert_eq!(parsed.fingerprint, None);
        assert_eq!(parsed.logical_path, "css/site.css");

        // Uppercase hex is not a fingerprint
        let upper = format!("app-{}.js", hex(32).to_uppercase());
        assert_eq!(AssetPath::parse(&upper).fingerprint, None);

        // Fingerprint must sit right before the extension
        let no_ext = format!("app-{}", hex(32));
        assert_eq!(AssetPath::parse(&no_ext).fingerprint, None);
    }

    #[test]
    fn test_fingerprint_round_trip() {
        let digest = hex(32);
        for logical in ["app.js", "css/site.css", "vendor/jquery.min.js"] {
            let url = public_url("assets", logical, &digest);
            let served = strip_mount(&url, "assets").unwrap();
            let parsed = AssetPath::parse(served);
            assert_eq!(parsed.logical_path, logical);
            assert_eq!(parsed.fingerprint.as_deref(), Some(digest.as_str()));
        }
    }

    #[test]
    fn test_resource() {
        assert_eq!(AssetPath::parse("js/app.js").resource(), "app.js");
        assert_eq!(AssetPath::parse("app.js").resource(), "app.js");
    }

    #[test]
    fn test_invalid_paths() {
        assert!(is_invalid_path("../../etc/passwd"));
        assert!(is_invalid_path("js/..%2f"));
        assert!(is_invalid_path("app.js\0.png"));
        assert!(is_invalid_path("/etc/passwd"));
        assert!(!is_invalid_path("js/app.js"));
    }

    #[test]
    fn test_strip_mount() {
        assert_eq!(strip_mount("/assets/app.js", "assets"), Some("app.js"));
        assert_eq!(strip_mount("/assets/app.js", "/assets/"), Some("app.js"));
        assert_eq!(strip_mount("/app.js", ""), Some("app.js"));
        assert_eq!(strip_mount("/assetsx/app.js", "assets"), None);
        assert_eq!(strip_mount("/other/app.js", "assets"), None);
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("my%20app.js").as_deref(), Some("my app.js"));
        assert_eq!(decode("%2e%2e/secret").as_deref(), Some("../secret"));
        assert_eq!(decode("%ff"), None);
    }

    #[test]
    fn test_public_url() {
        let d = "abc";
        assert_eq!(public_url("assets", "app.js", d), "/assets/app-abc.js");
        assert_eq!(public_url("/assets/", "app.js", d), "/assets/app-abc.js");
        assert_eq!(public_url("", "app.js", d), "/app-abc.js");
        assert_eq!(
            public_url("https://cdn.example.com", "app.js", d),
            "https://cdn.example.com/app-abc.js"
        );
        assert_eq!(
            public_url("//cdn.example.com", "js/app.min.js", d),
            "//cdn.example.com/js/app.min-abc.js"
        );
    }

    #[test]
    fn test_inject_digest() {
        assert_eq!(inject_digest("/a.v1/app", "abc"), "/a.v1/app");
        assert_eq!(inject_digest("/a/app.css", "abc"), "/a/app-abc.css");
    }
}
