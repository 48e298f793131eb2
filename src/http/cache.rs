//! HTTP cache control module
//!
//! Provides `ETag` formatting, conditional request matching and HTTP dates.

use chrono::{DateTime, Utc};

/// Fingerprinted URLs never change content, so they may be cached for a year
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Quote a digest for use as an `ETag`
pub fn quoted_etag(digest: &str) -> String {
    format!("\"{digest}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Only an exact match counts; lists and wildcards are not expanded.
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| client_etag == etag)
}

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
