//! Request builder and dispatcher.
//!
//! # Design
//! `build_request` turns a url plus a `RequestConfig` into an `HttpRequest`
//! without any I/O. `issue` hands that request to a `Transport` and maps a
//! non-2xx status to `ApiError::Http`; transport failures pass through.
//!
//! Precedence, lowest first:
//! 1. `X-Requested-With: Fetch`,
//! 2. caller headers, replacing defaults with the same name (ASCII case
//!    ignored),
//! 3. the `Content-Type` of the computed body.

use tracing::{debug, warn};

use crate::error::{ApiError, HttpError, VIUR_ERROR_HEADER};
use crate::form;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::params::Params;
use crate::transport::Transport;

pub const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "Fetch");

/// Everything that shapes one request besides its url.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// JSON payload. Implies `POST` when `method` is unset.
    pub json: Option<serde_json::Value>,
    /// Explicit method; inferred when `None`.
    pub method: Option<HttpMethod>,
    pub params: Option<Params>,
    /// Header overrides.
    pub headers: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, json: serde_json::Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The method the request will use.
    pub fn effective_method(&self) -> HttpMethod {
        match (self.method, &self.json) {
            (Some(method), _) => method,
            (None, Some(_)) => HttpMethod::Post,
            (None, None) => HttpMethod::Get,
        }
    }
}

/// Build the request described by `url` and `config`.
///
/// Fails with `ApiError::InvalidConfig` when both `json` and `params` are set:
/// the payload would be split between the body and the url.
pub fn build_request(url: &str, config: RequestConfig) -> Result<HttpRequest, ApiError> {
    if url.is_empty() {
        return Err(ApiError::InvalidConfig("empty url".to_string()));
    }
    if config.json.is_some() && config.params.is_some() {
        return Err(ApiError::InvalidConfig(
            "`json` and `params` cannot be combined".to_string(),
        ));
    }

    let method = config.effective_method();
    let mut url = url.to_string();

    let body = match (&config.json, &config.params) {
        (Some(json), _) => Some(RequestBody {
            content_type: "application/json".to_string(),
            bytes: serde_json::to_vec(json).map_err(|e| ApiError::Serialization(e.to_string()))?,
        }),
        (None, Some(params)) if method == HttpMethod::Post => Some(match params {
            Params::QueryString(query) => form::urlencoded(query),
            Params::Fields(fields) => form::multipart(&fields.entries()),
            Params::RawForm(raw) => form::multipart(&raw.entries()),
        }),
        (None, Some(params)) if method == HttpMethod::Get => {
            let query = params.to_query()?;
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
            None
        }
        _ => None,
    };

    let mut headers = vec![(REQUESTED_WITH.0.to_string(), REQUESTED_WITH.1.to_string())];
    for (name, value) in config.headers {
        set_header(&mut headers, name, value);
    }
    if let Some(body) = &body {
        set_header(&mut headers, "Content-Type".to_string(), body.content_type.clone());
    }

    Ok(HttpRequest {
        method,
        url,
        headers,
        body,
    })
}

fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
        Some(slot) => *slot = (name, value),
        None => headers.push((name, value)),
    }
}

/// Pass 2xx responses through untouched, turn anything else into an
/// `HttpError` carrying the response.
pub fn check_response(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    warn!(
        status = response.status,
        viur_error = response.header(VIUR_ERROR_HEADER).unwrap_or_default(),
        "request failed"
    );
    Err(HttpError::from_response(response).into())
}

/// Build, dispatch and status-check a single request.
pub async fn issue<T: Transport>(
    transport: &T,
    url: &str,
    config: RequestConfig,
) -> Result<HttpResponse, ApiError> {
    let request = build_request(url, config)?;
    debug!(method = request.method.as_str(), url = %request.url, "dispatching request");
    let response = transport.send(request).await?;
    check_response(response)
}
