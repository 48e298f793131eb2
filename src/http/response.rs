//! HTTP response building module
//!
//! Provides builders for the status codes the asset responder emits.

use super::cache::IMMUTABLE_CACHE_CONTROL;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::Response;

/// Validator and date headers shared by 200 and 304 asset responses
#[derive(Debug, Clone)]
pub struct CacheHeaders {
    pub date: String,
    pub last_modified: String,
    pub etag: String,
}

impl CacheHeaders {
    fn apply(&self, builder: Builder) -> Builder {
        builder
            .header("Cache-Control", IMMUTABLE_CACHE_CONTROL)
            .header("Date", &self.date)
            .header("Last-Modified", &self.last_modified)
            .header("ETag", &self.etag)
    }
}

/// Build 304 Not Modified response
pub fn build_304_response(headers: &CacheHeaders) -> Response<Full<Bytes>> {
    headers
        .apply(Response::builder().status(304))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 response for an asset
///
/// `body` is empty for HEAD requests while `content_length` still reports
/// the full size.
pub fn build_asset_response(
    body: Bytes,
    content_length: usize,
    content_type: &str,
    headers: &CacheHeaders,
) -> Response<Full<Bytes>> {
    let mut builder = headers.apply(Response::builder().status(200));
    if !content_type.is_empty() {
        builder = builder.header("Content-Type", content_type);
    }

    builder
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<Full<Bytes>> {
    build_plain_response(400, "Bad Request", None)
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_plain_response(404, "Not Found", None)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    build_plain_response(405, "Method Not Allowed", Some(("Allow", "GET, HEAD")))
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_plain_response(500, "Internal Server Error", None)
}

fn build_plain_response(
    status: u16,
    reason: &'static str,
    extra: Option<(&'static str, &'static str)>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=UTF-8")
        .header("Content-Length", reason.len());
    if let Some((name, value)) = extra {
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(Bytes::from_static(reason.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from_static(reason.as_bytes())))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
