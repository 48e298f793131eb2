//! Fingerprinted asset responder
//!
//! Validates the request, resolves the asset and writes far-future cached
//! responses. Misses and digest mismatches produce no response so the caller
//! can fall through to its own handling.

use crate::assets::path::{self, AssetPath};
use crate::assets::{Assets, Result};
use crate::http::{self, cache, mime, CacheHeaders};
use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

/// The parts of a request the responder looks at
#[derive(Debug, Clone, Copy)]
pub struct AssetRequest<'a> {
    pub method: &'a Method,
    /// URL path, still percent-encoded, mount prefix included
    pub path: &'a str,
    pub if_none_match: Option<&'a str>,
}

/// Serve one asset request
///
/// `Ok(None)` means the request is not ours: outside the mount, unknown
/// asset, or a fingerprint that does not match the current digest.
/// Resolution errors are returned for the caller to report.
pub async fn serve_asset(
    assets: &Assets,
    req: &AssetRequest<'_>,
) -> Result<Option<Response<Full<Bytes>>>> {
    if !matches!(*req.method, Method::GET | Method::HEAD) {
        return Ok(Some(http::build_405_response()));
    }

    let Some(mounted) = path::strip_mount(req.path, &assets.options().local_serve_path) else {
        return Ok(None);
    };
    let decoded = match path::decode(mounted) {
        Some(p) if !path::is_invalid_path(&p) => p,
        _ => return Ok(Some(http::build_400_response())),
    };

    let requested = AssetPath::parse(&decoded);
    let Some(asset) = assets.lookup(&requested)? else {
        return Ok(None);
    };
    if requested.fingerprint.as_deref() != Some(asset.digest.as_str()) {
        crate::logger::log_debug(&format!(
            "Fingerprint mismatch for '{}': current digest {}",
            requested.logical_path, asset.digest
        ));
        return Ok(None);
    }

    let etag = cache::quoted_etag(&asset.digest);
    let headers = CacheHeaders {
        date: cache::http_date(Utc::now()),
        last_modified: cache::http_date(asset.mtime),
        etag,
    };

    if cache::check_etag_match(req.if_none_match, &headers.etag) {
        return Ok(Some(http::build_304_response(&headers)));
    }

    let content = asset.read_body().await?;
    let content_length = content.len();
    let body = if *req.method == Method::HEAD {
        Bytes::new()
    } else {
        content
    };

    Ok(Some(http::build_asset_response(
        body,
        content_length,
        &mime::with_charset(&asset.content_type),
        &headers,
    )))
}
