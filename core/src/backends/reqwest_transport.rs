//! Async transport backed by `reqwest`.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{status_text, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// A [`Transport`] backed by a [`reqwest::Client`] with a cookie store, so
/// the session cookie the skey is bound to survives between calls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// No timeout beyond reqwest's defaults.
    pub fn new() -> Result<Self, TransportError> {
        Self::build(reqwest::Client::builder())
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        Self::build(reqwest::Client::builder().timeout(timeout))
    }

    /// Use an existing client as-is.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(builder: reqwest::ClientBuilder) -> Result<Self, TransportError> {
        let client = builder
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Other(Box::new(e)))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body.bytes);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status_text(status.as_u16(), status.canonical_reason()),
            headers,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else {
        TransportError::Other(Box::new(err))
    }
}
