//! Error types for the shop client.
//!
//! # Design
//! `HttpError` only ever describes a *completed* exchange with a non-2xx
//! status; it keeps the raw response so callers can inspect headers and body.
//! Failures where no response was obtained stay in `TransportError` and are
//! passed through untouched.

use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpResponse;

/// Header carrying the backend's summary of what went wrong.
pub const VIUR_ERROR_HEADER: &str = "x-viur-error";

/// Header set by the shop module when the body carries a structured error list.
pub const SHOP_ERROR_HEADER: &str = "x-viur-shop-error";

/// Errors returned by the request builder and the domain client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{0}")]
    Http(Box<HttpError>),

    /// No response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The endpoint exists on the backend but this client does not call it.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// The request configuration cannot be turned into a single request.
    #[error("invalid request configuration: {0}")]
    InvalidConfig(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The response JSON lacks a field the endpoint convention promises.
    #[error("response has no `{0}` field")]
    MissingField(&'static str),
}

impl ApiError {
    /// The HTTP error, if this failure came from a non-2xx response.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            ApiError::Http(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        ApiError::Http(Box::new(err))
    }
}

/// A completed response whose status indicates failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpError {
    pub status_code: u16,
    pub status_text: String,
    pub message: String,
    /// Structured errors from the shop module, empty when the body has none.
    pub shop_errors: Vec<ShopError>,
    pub response: HttpResponse,
}

impl HttpError {
    pub fn from_response(response: HttpResponse) -> Self {
        let detail = response.header(VIUR_ERROR_HEADER).unwrap_or_default();
        let message = format!("{} {}: {detail}", response.status, response.status_text);
        let shop_errors = if response.header(SHOP_ERROR_HEADER).is_some() {
            serde_json::from_slice::<ShopErrorBody>(&response.body)
                .map(|body| body.errors)
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        Self {
            status_code: response.status,
            status_text: response.status_text.clone(),
            message,
            shop_errors,
            response,
        }
    }
}

/// One entry of the shop module's error body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub customer_message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Deserialize)]
struct ShopErrorBody {
    errors: Vec<ShopError>,
}

/// Failure of the underlying transport before a response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}
