//! Pluggable transport executing `HttpRequest` values.

use std::future::Future;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes a single HTTP exchange.
///
/// Every completed exchange is `Ok`, whatever its status; interpreting the
/// status is the dispatcher's job. `Err` means no response was obtained.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for &T {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
