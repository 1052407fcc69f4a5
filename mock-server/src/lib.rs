//! In-memory stand-in for the ViUR shop endpoints the client talks to.
//!
//! Routes mirror the backend's layout: the shop api under `/shop/api`, the
//! order module under `/shop/order`, plus the skey, address and user
//! endpoints of the surrounding ViUR app. Errors use the shop module's
//! format (see `ShopError`).

mod error;
mod fields;
mod handlers;

use std::{collections::HashSet, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub use error::ShopError;
pub use fields::Fields;

/// Key of the user `/vi/user/view/self` resolves to.
pub const SELF_USER_KEY: &str = "user-self";

/// Backend state. Entities are kept as JSON objects in insertion order.
#[derive(Debug, Default)]
pub struct ShopState {
    pub skeys: HashSet<String>,
    pub carts: Vec<Value>,
    pub articles: Vec<Value>,
    pub addresses: Vec<Value>,
    pub orders: Vec<Value>,
    pub discounts: Vec<Value>,
    pub applied_discounts: Vec<String>,
}

impl ShopState {
    /// Empty shop with one redeemable discount code, `SUMMER`.
    pub fn seeded() -> Self {
        Self {
            discounts: vec![json!({
                "key": "discount-summer",
                "code": "SUMMER",
                "discount_type": "percentage",
                "percentage": 10,
            })],
            ..Default::default()
        }
    }

    /// Mint a single-use skey.
    pub fn issue_skey(&mut self) -> String {
        let skey = Uuid::new_v4().simple().to_string();
        self.skeys.insert(skey.clone());
        skey
    }

    /// Consume `skey`; false when it was never issued or already used.
    pub fn consume_skey(&mut self, skey: &str) -> bool {
        self.skeys.remove(skey)
    }
}

pub type Db = Arc<RwLock<ShopState>>;

pub fn new_key(kind: &str) -> String {
    format!("{kind}-{}", Uuid::new_v4().simple())
}

pub fn app() -> Router {
    app_with_state(Arc::new(RwLock::new(ShopState::seeded())))
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/json/skey", get(handlers::skey))
        .route("/json/shop/address/list", get(handlers::address_list))
        .route("/json/shop/address/add", post(handlers::address_add))
        .route("/vi/user/view/{key}", get(handlers::user_view))
        .route("/shop/api/article_view", get(handlers::article_view))
        .route("/shop/api/article_add", post(handlers::article_add))
        .route("/shop/api/article_update", post(handlers::article_update))
        .route("/shop/api/article_move", post(handlers::article_move))
        .route("/shop/api/cart_list", get(handlers::cart_list))
        .route("/shop/api/cart_add", post(handlers::cart_add))
        .route("/shop/api/cart_update", post(handlers::cart_update))
        .route("/shop/api/cart_remove", post(handlers::cart_remove))
        .route("/shop/api/cart_clear", post(handlers::cart_clear))
        .route("/shop/api/order_view", get(handlers::order_view))
        .route("/shop/api/order_add", post(handlers::order_add))
        .route("/shop/api/order_update", post(handlers::order_update))
        .route("/shop/api/order_remove", post(handlers::order_remove))
        .route("/shop/api/discount_add", post(handlers::discount_add))
        .route("/shop/api/discount_remove", post(handlers::discount_remove))
        .route("/shop/api/shipping_list", get(handlers::shipping_list))
        .route(
            "/shop/order/payment_providers_list",
            get(handlers::payment_providers_list),
        )
        .route("/shop/order/checkout_start", post(handlers::checkout_start))
        .route("/shop/order/checkout_order", post(handlers::checkout_order))
        .route("/shop/order/pp_get_settings", post(handlers::pp_get_settings))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}
