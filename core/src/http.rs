//! HTTP transport types shared by the request builder and the transports.
//!
//! # Design
//! Requests and responses are plain data. `request::build_request` produces an
//! `HttpRequest` without touching the network, a `Transport` executes it and
//! hands back an `HttpResponse`. Keeping both sides as owned values makes the
//! builder deterministic and lets tests script responses without a server.

use std::borrow::Cow;

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An encoded request body together with the content type it was encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl RequestBody {
    /// Body as UTF-8 text. Every encoder in this crate produces UTF-8.
    pub fn as_text(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }
}

/// An HTTP request described as plain data.
///
/// The `Content-Type` header of a body is already present in `headers`;
/// transports send the headers verbatim.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Look up a header value, ignoring ASCII case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// This is the "raw response" a successful dispatch resolves with. The body
/// is kept as received; decoding is a separate step (`text`, `json`).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value, ignoring ASCII case of the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

/// Reason phrase for a status line. Codes without a canonical phrase fall
/// back to the numeric code, so `status_text` is never empty.
pub fn status_text(status: u16, reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => reason.to_string(),
        _ => status.to_string(),
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: String::new(),
            headers: vec![("X-ViUR-Error".to_string(), "boom".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(response(200, "").is_success());
        assert!(response(204, "").is_success());
        assert!(!response(199, "").is_success());
        assert!(!response(302, "").is_success());
        assert!(!response(404, "").is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(500, "");
        assert_eq!(resp.header("x-viur-error"), Some("boom"));
        assert_eq!(resp.header("x-missing"), None);
    }

    #[test]
    fn json_returns_body_unchanged() {
        let resp = response(200, r#"{"cart":{"key":"c1","total":3}}"#);
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value, serde_json::json!({"cart": {"key": "c1", "total": 3}}));
    }

    #[test]
    fn json_reports_bad_body() {
        let err = response(200, "<html>").json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn body_is_kept_as_raw_bytes() {
        let resp = HttpResponse {
            status: 404,
            status_text: "Not Found".to_string(),
            headers: Vec::new(),
            body: vec![0xff, 0xfe, b'A'],
        };
        assert_eq!(resp.body, [0xff, 0xfe, b'A']);
        assert_eq!(resp.text(), "\u{fffd}\u{fffd}A");
        assert!(matches!(resp.json::<serde_json::Value>(), Err(ApiError::Deserialization(_))));
    }

    #[test]
    fn status_text_falls_back_to_code() {
        assert_eq!(status_text(404, Some("Not Found")), "Not Found");
        assert_eq!(status_text(499, None), "499");
        assert_eq!(status_text(599, Some("")), "599");
    }
}
