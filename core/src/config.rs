//! Where the shop lives.

/// Immutable location of the backend. All paths are joined onto `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    origin: String,
    api_path: String,
    order_path: String,
}

impl ShopConfig {
    pub const DEFAULT_API_PATH: &'static str = "/shop/api";
    pub const DEFAULT_ORDER_PATH: &'static str = "/shop/order";

    /// `origin` is scheme, host and optional port, e.g. `https://shop.example`.
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            api_path: Self::DEFAULT_API_PATH.to_string(),
            order_path: Self::DEFAULT_ORDER_PATH.to_string(),
        }
    }

    /// Mount point of the shop api module, `/shop/api` by default.
    pub fn with_api_path(mut self, path: &str) -> Self {
        self.api_path = normalize_path(path);
        self
    }

    /// Mount point of the order module, `/shop/order` by default.
    pub fn with_order_path(mut self, path: &str) -> Self {
        self.order_path = normalize_path(path);
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Absolute url of `path` on the origin.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, normalize_path(path))
    }

    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}/{endpoint}", self.origin, self.api_path)
    }

    pub fn order_url(&self, endpoint: &str) -> String {
        format!("{}{}/{endpoint}", self.origin, self.order_path)
    }
}

fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ShopConfig::new("http://localhost:8080/");
        assert_eq!(config.api_url("cart_list"), "http://localhost:8080/shop/api/cart_list");
        assert_eq!(config.url("/json/skey"), "http://localhost:8080/json/skey");
    }

    #[test]
    fn custom_paths_are_normalized() {
        let config = ShopConfig::new("https://shop.example")
            .with_api_path("store/api/")
            .with_order_path("/store/order");
        assert_eq!(config.api_url("order_view"), "https://shop.example/store/api/order_view");
        assert_eq!(
            config.order_url("checkout_start"),
            "https://shop.example/store/order/checkout_start"
        );
    }
}
