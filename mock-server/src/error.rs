use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// An error reply in the shop module's format: the summary goes into
/// `x-viur-error`, the details into an `errors` list in the body.
#[derive(Debug)]
pub struct ShopError {
    pub status: StatusCode,
    pub message: String,
}

impl ShopError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn missing(param: &str) -> Self {
        Self::bad_request(format!("Missing parameter {param}"))
    }

    pub fn invalid_skey() -> Self {
        Self::new(StatusCode::PRECONDITION_FAILED, "Missing or invalid skey")
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        tracing::warn!(status = self.status.as_u16(), message = %self.message, "request rejected");
        let summary: String = self
            .message
            .chars()
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .take(1024)
            .collect();
        let body = json!({
            "errors": [{
                "code": self.status.as_u16().to_string(),
                "message": self.message,
                "customer_message": self.message,
                "details": null,
            }],
        });
        (
            self.status,
            [("x-viur-error", summary), ("x-viur-shop-error", "1".to_string())],
            Json(body),
        )
            .into_response()
    }
}
