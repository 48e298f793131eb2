//! Template tag helper
//!
//! Turns logical asset paths into markup referencing their fingerprinted
//! URLs. A bundle expands into one tag per constituent unless the
//! configuration asks for bundled output.

use super::asset::Asset;
use super::error::{AssetError, Result};
use super::path::public_url;
use super::Assets;
use serde_json::{Map, Value};

/// Tag attributes, written in insertion order
pub type Attributes = Map<String, Value>;

impl Assets {
    /// Build a path-to-markup function
    ///
    /// `tag_writer` receives the public URL and the rendered attribute
    /// string. With `ext` set, paths missing that extension get it appended.
    /// An unresolvable path is an error naming where the lookup searched.
    pub fn helper<'a, W>(
        &'a self,
        tag_writer: W,
        ext: Option<&str>,
    ) -> impl Fn(&str, Option<&Attributes>) -> Result<String> + 'a
    where
        W: Fn(&str, &str) -> String + 'a,
    {
        let ext = ext.map(|e| format!(".{}", e.trim_start_matches('.')));

        move |path, attributes| {
            let path = match &ext {
                Some(ext) if !path.ends_with(ext.as_str()) => format!("{path}{ext}"),
                _ => path.to_string(),
            };

            let asset = self
                .resolver
                .find_asset(&path, true)?
                .ok_or_else(|| AssetError::TagNotFound {
                    location: self.resolver.search_location(),
                    path,
                })?;

            let attributes = parse_attributes(attributes);
            let tag = |asset: &Asset| {
                let url = public_url(&self.options.serve_path, &asset.logical_path, &asset.digest);
                tag_writer(&url, &attributes)
            };

            if !self.options.build && asset.is_bundle() {
                let tags: Vec<String> = asset.to_array().into_iter().map(|a| tag(a)).collect();
                Ok(tags.join("\n"))
            } else {
                Ok(tag(&asset))
            }
        }
    }
}

/// Render attributes: `true` as a bare name, strings as `name="value"`
///
/// Every other value, `false` included, is skipped.
pub fn parse_attributes(attributes: Option<&Attributes>) -> String {
    let Some(attributes) = attributes else {
        return String::new();
    };

    attributes
        .iter()
        .filter_map(|(name, value)| match value {
            Value::Bool(true) => Some(name.clone()),
            Value::String(s) => Some(format!("{name}=\"{s}\"")),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<script>` tag writer
pub fn script_tag(url: &str, attributes: &str) -> String {
    if attributes.is_empty() {
        format!("<script src=\"{url}\"></script>")
    } else {
        format!("<script src=\"{url}\" {attributes}></script>")
    }
}

/// Stylesheet `<link>` tag writer
pub fn stylesheet_tag(url: &str, attributes: &str) -> String {
    if attributes.is_empty() {
        format!("<link rel=\"stylesheet\" href=\"{url}\">")
    } else {
        format!("<link rel=\"stylesheet\" href=\"{url}\" {attributes}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::asset::compute_digest;
    use crate::assets::manifest::MANIFEST_FILE;
    use crate::config::AssetsConfig;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn source_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.js"), "a\n").unwrap();
        fs::write(dir.path().join("b.js"), "b\n").unwrap();
        fs::write(
            dir.path().join("app.js"),
            "//= require a\n//= require b\napp\n",
        )
        .unwrap();
        dir
    }

    fn compiling(src: &TempDir, build: bool) -> Assets {
        Assets::new(AssetsConfig {
            paths: vec![src.path().to_path_buf()],
            build,
            ..AssetsConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_bundle_expands_per_file() {
        let src = source_tree();
        let assets = compiling(&src, false);
        let js = assets.helper(script_tag, Some("js"));

        let html = js("app", None).unwrap();
        let expected = ["a", "b", "app"]
            .iter()
            .map(|name| {
                let digest = compute_digest(format!("{name}\n").as_bytes());
                format!("<script src=\"/assets/{name}-{digest}.js\"></script>")
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(html, expected);
    }

    #[test]
    fn test_bundle_single_tag_when_built() {
        let src = source_tree();
        let assets = compiling(&src, true);
        let js = assets.helper(script_tag, Some("js"));

        let html = js("app.js", None).unwrap();
        let digest = compute_digest(b"a\nb\napp\n");
        assert_eq!(
            html,
            format!("<script src=\"/assets/app-{digest}.js\"></script>")
        );
    }

    #[test]
    fn test_missing_asset_names_search_path() {
        let src = source_tree();
        let assets = compiling(&src, false);
        let css = assets.helper(stylesheet_tag, Some("css"));

        let err = css("missing", None).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Asset 'missing.css' not found in search path:\n    "));
        assert!(message.contains(&src.path().display().to_string()));
    }

    #[test]
    fn test_manifest_mode_helper() {
        let build = TempDir::new().unwrap();
        let digest = "0123456789abcdef0123456789abcdef";
        fs::write(
            build.path().join(MANIFEST_FILE),
            format!(r#"{{"assets":{{"site.css":{{"digest":"{digest}"}}}}}}"#),
        )
        .unwrap();
        let assets = Assets::new(AssetsConfig {
            compile: false,
            build_dir: Some(build.path().to_path_buf()),
            serve_path: "https://cdn.example.com/static".to_string(),
            ..AssetsConfig::default()
        })
        .unwrap();

        let css = assets.helper(stylesheet_tag, None);
        let attrs = json!({"media": "print", "crossorigin": true});
        let html = css("site.css", attrs.as_object()).unwrap();
        assert_eq!(
            html,
            format!(
                "<link rel=\"stylesheet\" href=\"https://cdn.example.com/static/site-{digest}.css\" media=\"print\" crossorigin>"
            )
        );

        let err = css("other.css", None).unwrap_err().to_string();
        assert!(err.contains("not found in manifest:\n    "));
        assert!(err.ends_with(MANIFEST_FILE));
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = json!({
            "async": true,
            "defer": false,
            "type": "module",
            "data-n": 3,
            "nonce": null,
            "integrity": "sha384-x"
        });
        assert_eq!(
            parse_attributes(attrs.as_object()),
            "async type=\"module\" integrity=\"sha384-x\""
        );
        assert_eq!(parse_attributes(None), "");
    }

    #[test]
    fn test_tag_writers() {
        assert_eq!(script_tag("/a.js", ""), "<script src=\"/a.js\"></script>");
        assert_eq!(
            script_tag("/a.js", "defer"),
            "<script src=\"/a.js\" defer></script>"
        );
        assert_eq!(
            stylesheet_tag("/a.css", ""),
            "<link rel=\"stylesheet\" href=\"/a.css\">"
        );
    }
}
