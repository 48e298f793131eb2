//! MIME type detection module
//!
//! Maps asset file extensions to Content-Type values and applies the
//! charset rule for textual types.

use std::path::Path;

/// Get MIME Content-Type based on the extension of an asset path
///
/// # Examples
/// ```
/// use asset_server::http::mime::content_type_for;
/// assert_eq!(content_type_for("js/app.js"), "text/javascript");
/// assert_eq!(content_type_for("site.css"), "text/css");
/// assert_eq!(content_type_for("blob"), "application/octet-stream");
/// ```
pub fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path).extension().and_then(|e| e.to_str());
    match extension {
        // Text
        Some("css") => "text/css",
        Some("html" | "htm") => "text/html",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",

        // Scripts
        Some("js" | "mjs") => "text/javascript",
        Some("json" | "map") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",

        _ => "application/octet-stream",
    }
}

/// Content type of a prebuilt output served in flush mode
///
/// Only stylesheets and scripts are recognised; anything else is empty.
pub fn output_content_type(resource: &str) -> &'static str {
    match Path::new(resource).extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        _ => "",
    }
}

/// Whether a content type carries text and should declare a charset
pub fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.ends_with("/json")
        || content_type.ends_with("/javascript")
}

/// Append `; charset=UTF-8` to textual content types
pub fn with_charset(content_type: &str) -> String {
    if is_textual(content_type) {
        format!("{content_type}; charset=UTF-8")
    } else {
        content_type.to_string()
    }
}
