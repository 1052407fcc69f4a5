//! Domain client for the ViUR shop endpoints.
//!
//! # Design
//! `ShopClient` holds only its `ShopConfig` and a transport; no state is
//! carried between calls. Every method is one request/response exchange
//! built through `request::issue`, except the token flows (`address_add`,
//! `order_checkout_start`) which await a fresh skey first and send it as the
//! `skey` param of the write.
//!
//! Reads return the decoded JSON, optionally narrowed to a named sub-field
//! (`skellist`, `values`) where the endpoint wraps its payload.

use serde_json::Value;
use tracing::debug;

use crate::config::ShopConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpResponse};
use crate::params::FormFields;
use crate::request::{issue, RequestConfig};
use crate::transport::Transport;
use crate::types::{
    AddressAdd, ArticleKeys, ArticleMove, ArticleQuantity, CartAdd, CartClear, CartUpdate,
    DiscountAdd, OrderAdd, OrderUpdate,
};

/// Page size of `address_list`.
pub const ADDRESS_LIST_LIMIT: u32 = 100;

pub const SKEY_PATH: &str = "/json/skey";
pub const ADDRESS_LIST_PATH: &str = "/json/shop/address/list";
pub const ADDRESS_ADD_PATH: &str = "/json/shop/address/add";
pub const USER_VIEW_PATH: &str = "/vi/user/view";

/// Async client for the shop backend.
#[derive(Debug, Clone)]
pub struct ShopClient<T> {
    config: ShopConfig,
    transport: T,
}

#[cfg(feature = "reqwest-transport")]
impl ShopClient<crate::backends::ReqwestTransport> {
    /// Client for `origin` over a cookie-aware reqwest transport.
    pub fn connect(origin: &str) -> Result<Self, ApiError> {
        let transport = crate::backends::ReqwestTransport::new()?;
        Ok(Self::new(ShopConfig::new(origin), transport))
    }
}

impl<T: Transport> ShopClient<T> {
    pub fn new(config: ShopConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue an arbitrary request through this client's transport. `path` is
    /// joined onto the configured origin.
    pub async fn request(&self, path: &str, config: RequestConfig) -> Result<HttpResponse, ApiError> {
        issue(&self.transport, &self.config.url(path), config).await
    }

    /// Fetch a fresh anti-CSRF token.
    pub async fn fetch_token(&self) -> Result<String, ApiError> {
        let response = issue(&self.transport, &self.config.url(SKEY_PATH), RequestConfig::new()).await?;
        response.json()
    }

    async fn get(&self, url: &str, params: Option<FormFields>) -> Result<Value, ApiError> {
        let mut config = RequestConfig::new().method(HttpMethod::Get);
        if let Some(params) = params {
            config = config.params(params);
        }
        issue(&self.transport, url, config).await?.json()
    }

    async fn post(&self, url: &str, params: FormFields) -> Result<Value, ApiError> {
        let config = RequestConfig::new().method(HttpMethod::Post).params(params);
        issue(&self.transport, url, config).await?.json()
    }

    /// Post `params` with a freshly fetched skey in front of them.
    async fn post_with_token(&self, url: &str, params: FormFields) -> Result<Value, ApiError> {
        let skey = self.fetch_token().await?;
        debug!(url, "obtained skey for protected write");
        let params = FormFields::new().field("skey", skey).merge(params);
        self.post(url, params).await
    }

    // --- Article ------------------------------------------------------------

    pub async fn article_view(&self, keys: &ArticleKeys) -> Result<Value, ApiError> {
        self.get(&self.config.api_url("article_view"), Some(keys.to_fields()))
            .await
    }

    pub async fn article_add(&self, input: &ArticleQuantity) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("article_add"), input.to_fields())
            .await
    }

    pub async fn article_update(&self, input: &ArticleQuantity) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("article_update"), input.to_fields())
            .await
    }

    /// Not available through this client; fails without any I/O.
    pub async fn article_remove(&self, _keys: &ArticleKeys) -> Result<Value, ApiError> {
        Err(ApiError::NotImplemented("article_remove"))
    }

    pub async fn article_move(&self, input: &ArticleMove) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("article_move"), input.to_fields())
            .await
    }

    // --- Cart ---------------------------------------------------------------

    /// Root carts without a key, otherwise the direct children of `cart_key`.
    pub async fn cart_list(&self, cart_key: Option<&str>) -> Result<Value, ApiError> {
        let params = FormFields::new().optional("cart_key", cart_key);
        self.get(&self.config.api_url("cart_list"), Some(params)).await
    }

    pub async fn cart_add(&self, input: &CartAdd) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("cart_add"), input.to_fields())
            .await
    }

    pub async fn cart_update(&self, input: &CartUpdate) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("cart_update"), input.to_fields())
            .await
    }

    pub async fn cart_remove(&self, cart_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("cart_key", cart_key);
        self.post(&self.config.api_url("cart_remove"), params).await
    }

    pub async fn cart_clear(&self, input: &CartClear) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("cart_clear"), input.to_fields())
            .await
    }

    // --- Address ------------------------------------------------------------

    /// First page of the current user's addresses.
    pub async fn address_list(&self) -> Result<Value, ApiError> {
        let params = FormFields::new().field("limit", ADDRESS_LIST_LIMIT);
        let response = self
            .get(&self.config.url(ADDRESS_LIST_PATH), Some(params))
            .await?;
        take_field(response, "skellist")
    }

    /// Create an address; returns the stored values.
    pub async fn address_add(&self, input: &AddressAdd) -> Result<Value, ApiError> {
        let response = self
            .post_with_token(&self.config.url(ADDRESS_ADD_PATH), input.to_fields())
            .await?;
        take_field(response, "values")
    }

    // --- Order --------------------------------------------------------------

    pub async fn payment_providers_list(&self) -> Result<Value, ApiError> {
        self.get(&self.config.order_url("payment_providers_list"), None)
            .await
    }

    pub async fn order_view(&self, order_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("order_key", order_key);
        self.get(&self.config.api_url("order_view"), Some(params)).await
    }

    pub async fn order_add(&self, input: &OrderAdd) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("order_add"), input.to_fields())
            .await
    }

    pub async fn order_update(&self, input: &OrderUpdate) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("order_update"), input.to_fields())
            .await
    }

    pub async fn order_remove(&self, order_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("order_key", order_key);
        self.post(&self.config.api_url("order_remove"), params).await
    }

    pub async fn order_checkout_start(&self, order_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("order_key", order_key);
        self.post_with_token(&self.config.order_url("checkout_start"), params)
            .await
    }

    pub async fn order_checkout_order(&self, order_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("order_key", order_key);
        self.post(&self.config.order_url("checkout_order"), params)
            .await
    }

    /// Payment provider settings for the order's checkout.
    pub async fn order_pp_get_settings(&self, order_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("order_key", order_key);
        self.post(&self.config.order_url("pp_get_settings"), params)
            .await
    }

    // --- User ---------------------------------------------------------------

    /// `None` views the logged-in user (`self`). The key is sent as a single
    /// percent-encoded path segment.
    pub async fn user_view(&self, user_key: Option<&str>) -> Result<Value, ApiError> {
        let segment = urlencoding::encode(user_key.unwrap_or("self"));
        let path = format!("{USER_VIEW_PATH}/{segment}");
        let response = self.get(&self.config.url(&path), None).await?;
        take_field(response, "values")
    }

    // --- Discount -----------------------------------------------------------

    pub async fn discount_add(&self, input: &DiscountAdd) -> Result<Value, ApiError> {
        self.post(&self.config.api_url("discount_add"), input.to_fields())
            .await
    }

    pub async fn discount_remove(&self, discount_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("discount_key", discount_key);
        self.post(&self.config.api_url("discount_remove"), params)
            .await
    }

    // --- Shipping -----------------------------------------------------------

    /// Shipping options available for a (sub)cart.
    pub async fn shipping_list(&self, cart_key: &str) -> Result<Value, ApiError> {
        let params = FormFields::new().field("cart_key", cart_key);
        self.get(&self.config.api_url("shipping_list"), Some(params))
            .await
    }
}

fn take_field(value: Value, field: &'static str) -> Result<Value, ApiError> {
    match value {
        Value::Object(mut map) => map.remove(field).ok_or(ApiError::MissingField(field)),
        _ => Err(ApiError::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::error::TransportError;
    use crate::http::HttpRequest;
    use crate::types::{AddressType, CartType, OrderFields, QuantityMode};

    /// Replays queued responses and records every request it receives.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn with(responses: Vec<(u16, &str)>) -> Self {
            let transport = Self::default();
            for (status, body) in responses {
                transport.responses.lock().unwrap().push_back(Ok(HttpResponse {
                    status,
                    status_text: if status == 200 { "OK" } else { "Not Found" }.to_string(),
                    headers: vec![("x-viur-error".to_string(), "not found".to_string())],
                    body: body.as_bytes().to_vec(),
                }));
            }
            transport
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connection("no scripted response".to_string())))
        }
    }

    fn client(transport: ScriptedTransport) -> ShopClient<ScriptedTransport> {
        ShopClient::new(ShopConfig::new("http://shop.test"), transport)
    }

    fn body_text(request: &HttpRequest) -> &str {
        request.body.as_ref().map(|b| b.as_text()).unwrap_or_default()
    }

    #[tokio::test]
    async fn article_view_sends_keys_as_query() {
        let shop = client(ScriptedTransport::with(vec![(200, r#"{"quantity":2}"#)]));
        let value = shop.article_view(&ArticleKeys::new("a1", "c1")).await.unwrap();
        assert_eq!(value["quantity"], 2);

        let requests = shop.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(
            requests[0].url,
            "http://shop.test/shop/api/article_view?article_key=a1&parent_cart_key=c1"
        );
    }

    #[tokio::test]
    async fn article_add_posts_defaults() {
        let shop = client(ScriptedTransport::with(vec![(200, "{}")]));
        shop.article_add(&ArticleQuantity::new("a1", "c1")).await.unwrap();

        let requests = shop.transport().requests();
        let request = &requests[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://shop.test/shop/api/article_add");
        let body = body_text(request);
        assert!(body.contains("name=\"quantity\"\r\n\r\n1\r\n"));
        assert!(body.contains("name=\"quantity_mode\"\r\n\r\nincrease\r\n"));
    }

    #[tokio::test]
    async fn article_update_sends_chosen_mode() {
        let shop = client(ScriptedTransport::with(vec![(200, "{}")]));
        let input = ArticleQuantity::new("a1", "c1").quantity(5, QuantityMode::Replace);
        shop.article_update(&input).await.unwrap();
        let requests = shop.transport().requests();
        let request = &requests[0];
        assert!(body_text(request).contains("name=\"quantity_mode\"\r\n\r\nreplace\r\n"));
    }

    #[tokio::test]
    async fn article_remove_fails_without_io() {
        let shop = client(ScriptedTransport::default());
        let err = shop.article_remove(&ArticleKeys::new("a1", "c1")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotImplemented("article_remove")));
        assert!(shop.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn cart_list_without_key_has_no_query() {
        let shop = client(ScriptedTransport::with(vec![(200, "[]"), (200, "[]")]));
        shop.cart_list(None).await.unwrap();
        shop.cart_list(Some("c1")).await.unwrap();
        let requests = shop.transport().requests();
        assert_eq!(requests[0].url, "http://shop.test/shop/api/cart_list");
        assert_eq!(requests[1].url, "http://shop.test/shop/api/cart_list?cart_key=c1");
    }

    #[tokio::test]
    async fn cart_add_drops_unset_fields() {
        let shop = client(ScriptedTransport::with(vec![(200, "{}")]));
        let input = CartAdd {
            name: Some(String::new()),
            cart_type: Some(CartType::Wishlist),
            ..Default::default()
        };
        shop.cart_add(&input).await.unwrap();
        let body = body_text(&shop.transport().requests()[0]).to_string();
        assert!(body.contains("name=\"name\"\r\n\r\n\r\n"));
        assert!(body.contains("name=\"cart_type\"\r\n\r\nwishlist\r\n"));
        assert!(!body.contains("parent_cart_key"));
        assert!(!body.contains("discount_key"));
    }

    #[tokio::test]
    async fn address_list_extracts_skellist() {
        let shop = client(ScriptedTransport::with(vec![(
            200,
            r#"{"skellist":[{"key":"ad1"}],"cursor":null}"#,
        )]));
        let list = shop.address_list().await.unwrap();
        assert_eq!(list, serde_json::json!([{"key": "ad1"}]));
        assert!(shop.transport().requests()[0]
            .url
            .ends_with("/json/shop/address/list?limit=100"));
    }

    #[tokio::test]
    async fn address_add_fetches_token_first() {
        let shop = client(ScriptedTransport::with(vec![
            (200, r#""skey-1""#),
            (200, r#"{"action":"addSuccess","values":{"city":"Berlin"}}"#),
        ]));
        let input = AddressAdd {
            city: Some("Berlin".to_string()),
            customer_key: Some("u1".to_string()),
            ..Default::default()
        };
        let values = shop.address_add(&input).await.unwrap();
        assert_eq!(values["city"], "Berlin");

        let requests = shop.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "http://shop.test/json/skey");
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[1].url, "http://shop.test/json/shop/address/add");
        let body = body_text(&requests[1]);
        assert!(body.contains("name=\"skey\"\r\n\r\nskey-1\r\n"));
        assert!(body.contains("name=\"customer\"\r\n\r\nu1\r\n"));
    }

    #[tokio::test]
    async fn address_add_sends_every_address_type() {
        let shop = client(ScriptedTransport::with(vec![(200, r#""skey-1""#), (200, r#"{"values":{}}"#)]));
        let input = AddressAdd {
            address_type: Some(vec![AddressType::Billing, AddressType::Shipping]),
            ..Default::default()
        };
        shop.address_add(&input).await.unwrap();

        let requests = shop.transport().requests();
        let body = body_text(&requests[1]);
        assert!(body.contains("name=\"address_type\"\r\n\r\nbilling\r\n"));
        assert!(body.contains("name=\"address_type\"\r\n\r\nshipping\r\n"));
    }

    #[tokio::test]
    async fn address_add_stops_when_token_fails() {
        let shop = client(ScriptedTransport::with(vec![(404, "")]));
        let err = shop.address_add(&AddressAdd::default()).await.unwrap_err();
        assert_eq!(err.as_http().map(|e| e.status_code), Some(404));
        assert_eq!(shop.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn checkout_start_sends_token_and_order_key() {
        let shop = client(ScriptedTransport::with(vec![(200, r#""skey-2""#), (200, "{}")]));
        shop.order_checkout_start("o1").await.unwrap();
        let requests = shop.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].url, "http://shop.test/shop/order/checkout_start");
        let body = body_text(&requests[1]);
        assert!(body.contains("name=\"skey\"\r\n\r\nskey-2\r\n"));
        assert!(body.contains("name=\"order_key\"\r\n\r\no1\r\n"));
    }

    #[tokio::test]
    async fn checkout_order_and_settings_need_no_token() {
        let shop = client(ScriptedTransport::with(vec![(200, "{}"), (200, "{}")]));
        shop.order_checkout_order("o1").await.unwrap();
        shop.order_pp_get_settings("o1").await.unwrap();
        let requests = shop.transport().requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].url.ends_with("/shop/order/checkout_order"));
        assert!(requests[1].url.ends_with("/shop/order/pp_get_settings"));
    }

    #[tokio::test]
    async fn order_update_keeps_falsy_values() {
        let shop = client(ScriptedTransport::with(vec![(200, "{}")]));
        let input = OrderUpdate {
            order_key: Some("o1".to_string()),
            fields: OrderFields {
                state_rts: Some(false),
                ..Default::default()
            },
        };
        shop.order_update(&input).await.unwrap();
        let body = body_text(&shop.transport().requests()[0]).to_string();
        assert!(body.contains("name=\"state_rts\"\r\n\r\nfalse\r\n"));
        assert!(!body.contains("state_paid"));
    }

    #[tokio::test]
    async fn user_view_defaults_to_self() {
        let shop = client(ScriptedTransport::with(vec![(200, r#"{"values":{"name":"jane"}}"#)]));
        let user = shop.user_view(None).await.unwrap();
        assert_eq!(user["name"], "jane");
        assert_eq!(shop.transport().requests()[0].url, "http://shop.test/vi/user/view/self");
    }

    #[tokio::test]
    async fn user_key_stays_one_path_segment() {
        let shop = client(ScriptedTransport::with(vec![(200, r#"{"values":{}}"#)]));
        shop.user_view(Some("a/b?c#d")).await.unwrap();
        assert_eq!(
            shop.transport().requests()[0].url,
            "http://shop.test/vi/user/view/a%2Fb%3Fc%23d"
        );
    }

    #[tokio::test]
    async fn missing_sub_field_is_reported() {
        let shop = client(ScriptedTransport::with(vec![(200, r#"{"name":"jane"}"#)]));
        let err = shop.user_view(Some("u1")).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingField("values")));
    }

    #[tokio::test]
    async fn payment_providers_list_uses_order_module() {
        let shop = client(ScriptedTransport::with(vec![(200, r#"{"invoice":{}}"#)]));
        shop.payment_providers_list().await.unwrap();
        assert_eq!(
            shop.transport().requests()[0].url,
            "http://shop.test/shop/order/payment_providers_list"
        );
    }

    #[tokio::test]
    async fn http_failure_is_structured() {
        let shop = client(ScriptedTransport::with(vec![(404, "")]));
        let err = shop.order_view("missing").await.unwrap_err();
        let http = err.as_http().unwrap();
        assert_eq!(http.status_code, 404);
        assert_eq!(http.status_text, "Not Found");
        assert!(http.message.contains("404"));
        assert!(http.message.contains("not found"));
    }

    #[tokio::test]
    async fn transport_failure_passes_through() {
        let shop = client(ScriptedTransport::default());
        let err = shop.cart_remove("c1").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Connection(_))));
    }

    #[tokio::test]
    async fn every_request_carries_requested_with() {
        let shop = client(ScriptedTransport::with(vec![(200, "{}"), (200, "{}")]));
        shop.discount_add(&DiscountAdd::code("SUMMER")).await.unwrap();
        shop.shipping_list("c1").await.unwrap();
        for request in shop.transport().requests() {
            assert_eq!(request.header("X-Requested-With"), Some("Fetch"));
        }
    }
}
