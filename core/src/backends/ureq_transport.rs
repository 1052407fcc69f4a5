//! Blocking transport backed by `ureq`.
//!
//! ureq is synchronous, so `send` blocks the calling thread for the duration
//! of the exchange. Use it from a blocking context or a multi-threaded
//! runtime.

use std::io::Read;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{status_text, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// A [`Transport`] backed by a cookie-aware [`ureq::Agent`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            // Status codes are interpreted by the dispatcher.
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match request.body {
            Some(body) => {
                let req = builder
                    .body(body.bytes)
                    .map_err(|e| TransportError::Other(Box::new(e)))?;
                self.agent.run(req)
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| TransportError::Other(Box::new(e)))?;
                self.agent.run(req)
            }
        };

        match result {
            Ok(response) => convert_response(response),
            Err(ureq::Error::Timeout(_)) => Err(TransportError::Timeout),
            Err(ureq::Error::HostNotFound) => {
                Err(TransportError::Connection("host not found".to_string()))
            }
            Err(ureq::Error::Io(e)) => Err(TransportError::Connection(e.to_string())),
            Err(e) => Err(TransportError::Other(Box::new(e))),
        }
    }
}

fn convert_response(response: ureq::http::Response<ureq::Body>) -> Result<HttpResponse, TransportError> {
    let (parts, body) = response.into_parts();
    // The reader has no size cap, unlike `Body::read_to_vec`.
    let mut bytes = Vec::new();
    body.into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| TransportError::Connection(e.to_string()))?;
    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    Ok(HttpResponse {
        status: parts.status.as_u16(),
        status_text: status_text(parts.status.as_u16(), parts.status.canonical_reason()),
        headers,
        body: bytes,
    })
}
