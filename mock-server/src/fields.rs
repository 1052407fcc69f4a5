use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};

use crate::error::ShopError;

/// Request parameters in arrival order, from a query string, a urlencoded
/// body or a multipart body.
#[derive(Debug, Default, Clone)]
pub struct Fields(pub Vec<(String, String)>);

impl Fields {
    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, key: &str) -> Result<&str, ShopError> {
        self.get(key).ok_or_else(|| ShopError::missing(key))
    }

    pub fn all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| matches!(v, "true" | "1" | "True"))
    }
}

impl<S: Send + Sync> FromRequest<S> for Fields {
    type Rejection = ShopError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ShopError::bad_request(e.to_string()))?;
            let mut fields = Vec::new();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| ShopError::bad_request(e.to_string()))?
            {
                let name = field.name().unwrap_or_default().to_string();
                let value = field
                    .text()
                    .await
                    .map_err(|e| ShopError::bad_request(e.to_string()))?;
                fields.push((name, value));
            }
            Ok(Fields(fields))
        } else {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ShopError::bad_request(e.to_string()))?;
            Ok(Fields(fields))
        }
    }
}
