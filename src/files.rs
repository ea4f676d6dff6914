//! Single-file responses with conditional-GET support.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use httpdate::fmt_http_date;
use std::path::Path;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::ApiError;
use crate::etag::{etag_from_metadata, not_modified};

/// Streams the file at `path` to the client, answering 304 when the
/// request's validators still match the file's metadata.
pub async fn serve_file(path: &Path, request_headers: &HeaderMap) -> Result<Response, ApiError> {
    let metadata = fs::metadata(path).await?;
    let etag = etag_from_metadata(&metadata);
    let modified = metadata.modified().ok();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ETAG,
        HeaderValue::from_str(&etag)
            .map_err(|_| ApiError::Internal("invalid etag header".into()))?,
    );
    if let Some(modified) = modified {
        let value = fmt_http_date(modified);
        headers.insert(
            header::LAST_MODIFIED,
            HeaderValue::from_str(&value)
                .map_err(|_| ApiError::Internal("invalid last-modified header".into()))?,
        );
    }

    if not_modified(request_headers, &etag, modified) {
        debug!(path = %path.display(), "not modified");
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|_| ApiError::Internal("invalid mime type".into()))?,
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));

    let file = File::open(path).await?;
    debug!(path = %path.display(), size = metadata.len(), "serving file");
    let stream = ReaderStream::new(file);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}
