//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Requests under the asset mount go
//! to the asset responder; everything it declines ends in a 404.

use crate::assets::path;
use crate::assets::{AssetPath, Assets};
use crate::config::AppState;
use crate::handler::assets::{serve_asset, AssetRequest};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, CONTENT_LENGTH, IF_NONE_MATCH, REFERER, USER_AGENT};
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();

    let ctx = AssetRequest {
        method: &parts.method,
        path: parts.uri.path(),
        if_none_match: header_str(&parts.headers, &IF_NONE_MATCH),
    };

    let response = dispatch(&state.assets, &ctx).await;

    if state.access_log {
        let mut entry = AccessLogEntry::new(
            remote_addr.ip().to_string(),
            parts.method.to_string(),
            parts.uri.to_string(),
        );
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = header_str(response.headers(), &CONTENT_LENGTH)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.referer = header_str(&parts.headers, &REFERER).map(ToString::to_string);
        entry.user_agent = header_str(&parts.headers, &USER_AGENT).map(ToString::to_string);
        if matches!(entry.status, 200 | 304) {
            entry.asset = served_logical_path(&state.assets, parts.uri.path());
        }
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Turn an asset request into a response
///
/// Paths outside the mount and requests the responder declines get a 404.
/// Resolution failures are logged and answered with a 500.
pub async fn dispatch(assets: &Assets, ctx: &AssetRequest<'_>) -> Response<Full<Bytes>> {
    if path::strip_mount(ctx.path, &assets.options().local_serve_path).is_none() {
        return http::build_404_response();
    }

    match serve_asset(assets, ctx).await {
        Ok(Some(response)) => response,
        Ok(None) => http::build_404_response(),
        Err(e) => {
            logger::log_error(&format!("Failed to serve '{}': {e}", ctx.path));
            http::build_500_response()
        }
    }
}

/// Logical path behind a request the responder answered
fn served_logical_path(assets: &Assets, uri_path: &str) -> Option<String> {
    let mounted = path::strip_mount(uri_path, &assets.options().local_serve_path)?;
    let decoded = path::decode(mounted)?;
    Some(AssetPath::parse(&decoded).logical_path)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
