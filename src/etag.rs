//! ETag derivation and conditional-GET evaluation.

use axum::http::{HeaderMap, header};
use httpdate::parse_http_date;
use std::fs::Metadata;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Derives a weak ETag from file size and modification time.
pub fn etag_from_metadata(metadata: &Metadata) -> String {
    let size = metadata.len();
    let modified = metadata.modified().ok();
    if let Some(modified) = modified
        && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
    {
        return format!(
            "W/\"{}-{}-{}\"",
            size,
            duration.as_secs(),
            duration.subsec_nanos()
        );
    }
    format!("W/\"{}\"", size)
}

/// Decides whether a GET can be answered with 304 Not Modified.
///
/// A present `If-None-Match` decides alone and `If-Modified-Since` is
/// ignored, per RFC 7232; an unreadable value counts as a non-match.
pub fn not_modified(headers: &HeaderMap, etag: &str, modified: Option<SystemTime>) -> bool {
    if let Some(value) = headers.get(header::IF_NONE_MATCH) {
        return match value.to_str() {
            Ok(value) => value.trim() == "*" || etag_matches(value, etag),
            Err(_) => false,
        };
    }

    if let Some(value) = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        && let Ok(since) = parse_http_date(value)
        && let Some(modified) = modified
    {
        // HTTP dates carry whole seconds only, so truncate before comparing.
        if let Ok(duration) = modified.duration_since(UNIX_EPOCH) {
            let truncated = UNIX_EPOCH + Duration::from_secs(duration.as_secs());
            return truncated <= since;
        }
    }

    false
}

fn etag_matches(header_value: &str, current: &str) -> bool {
    header_value
        .split(',')
        .map(|item| item.trim())
        .any(|item| item == current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use httpdate::fmt_http_date;

    #[test]
    fn if_none_match_hit_yields_not_modified() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_static("W/\"3-1-0\""),
        );
        assert!(not_modified(&headers, "W/\"3-1-0\"", None));
        assert!(!not_modified(&headers, "W/\"3-2-0\"", None));
    }

    #[test]
    fn if_modified_since_honors_second_truncation() {
        let modified = UNIX_EPOCH + Duration::new(1_700_000_000, 500_000_000);
        let echoed = fmt_http_date(modified);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_str(&echoed).expect("header value"),
        );
        assert!(not_modified(&headers, "W/\"x\"", Some(modified)));

        let newer = modified + Duration::from_secs(5);
        assert!(!not_modified(&headers, "W/\"x\"", Some(newer)));
    }

    #[test]
    fn unreadable_if_none_match_is_a_non_match() {
        let modified = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_bytes(b"W/\"\xC3\xA9\"").expect("header value"),
        );
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(modified)).expect("header value"),
        );
        // If-Modified-Since matches, but a present If-None-Match decides.
        assert!(!not_modified(&headers, "W/\"mine\"", Some(modified)));
    }

    #[test]
    fn if_none_match_takes_precedence() {
        let modified = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("W/\"other\""));
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(modified)).expect("header value"),
        );
        assert!(!not_modified(&headers, "W/\"mine\"", Some(modified)));
    }
}
