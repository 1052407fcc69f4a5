use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::{new_key, Db, Fields, ShopError, SELF_USER_KEY};

type ApiResult = Result<Json<Value>, ShopError>;
type QueryPairs = Query<Vec<(String, String)>>;

const ADDRESS_FIELDS: &[&str] = &[
    "customer_type",
    "salutation",
    "company_name",
    "firstname",
    "lastname",
    "street_name",
    "street_number",
    "address_addition",
    "zip_code",
    "city",
    "country",
    "customer",
];

const CART_FIELDS: &[&str] = &[
    "name",
    "customer_comment",
    "shipping_address_key",
    "shipping_key",
    "discount_key",
];

const ORDER_FIELDS: &[&str] = &["payment_provider", "billing_address_key", "email", "customer_key"];
const ORDER_FLAGS: &[&str] = &["state_ordered", "state_paid", "state_rts"];

// --- helpers ---

fn find<'a>(items: &'a [Value], key: &str) -> Option<&'a Value> {
    items.iter().find(|item| item["key"] == key)
}

fn position(items: &[Value], key: &str) -> Option<usize> {
    items.iter().position(|item| item["key"] == key)
}

fn ensure_cart(carts: &[Value], key: &str) -> Result<(), ShopError> {
    find(carts, key)
        .map(|_| ())
        .ok_or_else(|| ShopError::not_found(format!("Cart {key} not found")))
}

fn order_position(orders: &[Value], key: &str) -> Result<usize, ShopError> {
    position(orders, key).ok_or_else(|| ShopError::not_found(format!("Order {key} not found")))
}

fn article_position(articles: &[Value], article_key: &str, parent_cart_key: &str) -> Option<usize> {
    articles.iter().position(|article| {
        article["article_key"] == article_key && article["parent_cart_key"] == parent_cart_key
    })
}

/// Copy the string params named in `keys` that the request carries.
fn set_present(target: &mut Value, fields: &Fields, keys: &[&str]) {
    for key in keys {
        if let Some(value) = fields.get(key) {
            target[*key] = json!(value);
        }
    }
}

fn set_flags(target: &mut Value, fields: &Fields, keys: &[&str]) {
    for key in keys {
        if let Some(flag) = fields.flag(key) {
            target[*key] = json!(flag);
        }
    }
}

fn parse_quantity(fields: &Fields) -> Result<u64, ShopError> {
    fields
        .require("quantity")?
        .parse()
        .map_err(|_| ShopError::bad_request("Invalid quantity"))
}

/// `root` and the keys of every cart below it.
fn subtree(carts: &[Value], root: &str) -> Vec<String> {
    let mut keys = vec![root.to_string()];
    let mut i = 0;
    while i < keys.len() {
        let parent = keys[i].clone();
        keys.extend(
            carts
                .iter()
                .filter(|cart| cart["parent_cart_key"] == parent.as_str())
                .filter_map(|cart| cart["key"].as_str().map(str::to_string)),
        );
        i += 1;
    }
    keys
}

fn is_under(value: &Value, field: &str, keys: &[String]) -> bool {
    value[field]
        .as_str()
        .is_some_and(|key| keys.iter().any(|k| k == key))
}

// --- session ---

pub async fn skey(State(db): State<Db>) -> Json<Value> {
    let skey = db.write().await.issue_skey();
    Json(Value::String(skey))
}

pub async fn user_view(Path(key): Path<String>) -> ApiResult {
    if key != "self" && key != SELF_USER_KEY {
        return Err(ShopError::not_found(format!("No user with key {key}")));
    }
    Ok(Json(json!({
        "action": "view",
        "values": {
            "key": SELF_USER_KEY,
            "name": "jane@example.com",
            "firstname": "Jane",
            "lastname": "Doe",
        },
    })))
}

// --- address ---

pub async fn address_list(State(db): State<Db>, Query(query): QueryPairs) -> ApiResult {
    let fields = Fields(query);
    let limit = match fields.get("limit") {
        Some(limit) => limit
            .parse::<usize>()
            .map_err(|_| ShopError::bad_request("Invalid limit"))?,
        None => 30,
    };
    let db = db.read().await;
    let skellist: Vec<Value> = db.addresses.iter().take(limit).cloned().collect();
    Ok(Json(json!({"action": "list", "skellist": skellist, "cursor": null})))
}

pub async fn address_add(State(db): State<Db>, fields: Fields) -> ApiResult {
    let mut db = db.write().await;
    if !db.consume_skey(fields.get("skey").unwrap_or_default()) {
        return Err(ShopError::invalid_skey());
    }
    let mut values = json!({"key": new_key("address")});
    set_present(&mut values, &fields, ADDRESS_FIELDS);
    set_flags(&mut values, &fields, &["is_default"]);
    let address_types = fields.all("address_type");
    if let Some(invalid) = address_types
        .iter()
        .find(|t| !matches!(**t, "billing" | "shipping"))
    {
        return Err(ShopError::bad_request(format!("Invalid address_type {invalid}")));
    }
    if !address_types.is_empty() {
        values["address_type"] = json!(address_types);
    }
    db.addresses.push(values.clone());
    Ok(Json(json!({"action": "addSuccess", "values": values})))
}

// --- article ---

pub async fn article_view(State(db): State<Db>, Query(query): QueryPairs) -> ApiResult {
    let fields = Fields(query);
    let article_key = fields.require("article_key")?;
    let parent_cart_key = fields.require("parent_cart_key")?;
    let db = db.read().await;
    article_position(&db.articles, article_key, parent_cart_key)
        .map(|index| Json(db.articles[index].clone()))
        .ok_or_else(|| {
            ShopError::not_found(format!(
                "{parent_cart_key} has no article with article_key={article_key}"
            ))
        })
}

pub async fn article_add(State(db): State<Db>, fields: Fields) -> ApiResult {
    let article_key = fields.require("article_key")?;
    let parent_cart_key = fields.require("parent_cart_key")?;
    let quantity = parse_quantity(&fields)?;
    let mut db = db.write().await;
    ensure_cart(&db.carts, parent_cart_key)?;
    if article_position(&db.articles, article_key, parent_cart_key).is_some() {
        return Err(ShopError::bad_request("Article already exists"));
    }
    let article = json!({
        "key": new_key("article"),
        "article_key": article_key,
        "parent_cart_key": parent_cart_key,
        "quantity": quantity,
    });
    db.articles.push(article.clone());
    Ok(Json(article))
}

pub async fn article_update(State(db): State<Db>, fields: Fields) -> ApiResult {
    let article_key = fields.require("article_key")?;
    let parent_cart_key = fields.require("parent_cart_key")?;
    let quantity = parse_quantity(&fields)?;
    let mut db = db.write().await;
    let index = article_position(&db.articles, article_key, parent_cart_key)
        .ok_or_else(|| ShopError::bad_request("Article does not exist"))?;
    let current = db.articles[index]["quantity"].as_u64().unwrap_or(0);
    let next = match fields.get("quantity_mode").unwrap_or("replace") {
        "replace" => quantity,
        "increase" => current + quantity,
        "decrease" => current.saturating_sub(quantity),
        other => return Err(ShopError::bad_request(format!("Invalid quantity_mode {other}"))),
    };
    // A quantity of zero takes the article out of the cart.
    if next == 0 {
        let mut article = db.articles.remove(index);
        article["quantity"] = json!(0);
        return Ok(Json(article));
    }
    db.articles[index]["quantity"] = json!(next);
    Ok(Json(db.articles[index].clone()))
}

pub async fn article_move(State(db): State<Db>, fields: Fields) -> ApiResult {
    let article_key = fields.require("article_key")?;
    let parent_cart_key = fields.require("parent_cart_key")?;
    let new_parent_cart_key = fields.require("new_parent_cart_key")?;
    let mut db = db.write().await;
    ensure_cart(&db.carts, new_parent_cart_key)?;
    let index = article_position(&db.articles, article_key, parent_cart_key)
        .ok_or_else(|| ShopError::bad_request("Article does not exist"))?;
    if article_position(&db.articles, article_key, new_parent_cart_key).is_some() {
        return Err(ShopError::bad_request("Article already exists in target cart"));
    }
    db.articles[index]["parent_cart_key"] = json!(new_parent_cart_key);
    Ok(Json(db.articles[index].clone()))
}

// --- cart ---

pub async fn cart_list(State(db): State<Db>, Query(query): QueryPairs) -> ApiResult {
    let fields = Fields(query);
    let db = db.read().await;
    let Some(cart_key) = fields.get("cart_key") else {
        let roots: Vec<Value> = db
            .carts
            .iter()
            .filter(|cart| cart["is_root_node"] == true)
            .cloned()
            .collect();
        return Ok(Json(Value::Array(roots)));
    };
    ensure_cart(&db.carts, cart_key)?;
    let nodes = db
        .carts
        .iter()
        .filter(|cart| cart["parent_cart_key"] == cart_key)
        .map(|cart| (cart, "node"));
    let leafs = db
        .articles
        .iter()
        .filter(|article| article["parent_cart_key"] == cart_key)
        .map(|article| (article, "leaf"));
    let children: Vec<Value> = nodes
        .chain(leafs)
        .map(|(child, skel_type)| {
            let mut child = child.clone();
            child["skel_type"] = json!(skel_type);
            child
        })
        .collect();
    Ok(Json(Value::Array(children)))
}

pub async fn cart_add(State(db): State<Db>, fields: Fields) -> ApiResult {
    let parent_cart_key = fields.get("parent_cart_key");
    let cart_type = fields.get("cart_type").unwrap_or("basket");
    if !matches!(cart_type, "basket" | "wishlist") {
        return Err(ShopError::bad_request(format!("Invalid cart_type {cart_type}")));
    }
    let mut db = db.write().await;
    if let Some(parent) = parent_cart_key {
        ensure_cart(&db.carts, parent)?;
    }
    let mut cart = json!({
        "key": new_key("cart"),
        "is_root_node": parent_cart_key.is_none(),
        "parent_cart_key": parent_cart_key,
        "cart_type": cart_type,
    });
    set_present(&mut cart, &fields, CART_FIELDS);
    db.carts.push(cart.clone());
    Ok(Json(cart))
}

pub async fn cart_update(State(db): State<Db>, fields: Fields) -> ApiResult {
    let cart_key = fields.require("cart_key")?;
    let mut db = db.write().await;
    let index = position(&db.carts, cart_key)
        .ok_or_else(|| ShopError::not_found(format!("Cart {cart_key} not found")))?;
    set_present(&mut db.carts[index], &fields, CART_FIELDS);
    Ok(Json(db.carts[index].clone()))
}

pub async fn cart_remove(State(db): State<Db>, fields: Fields) -> ApiResult {
    let cart_key = fields.require("cart_key")?;
    let mut db = db.write().await;
    ensure_cart(&db.carts, cart_key)?;
    let removed = subtree(&db.carts, cart_key);
    db.carts.retain(|cart| !is_under(cart, "key", &removed));
    db.articles.retain(|article| !is_under(article, "parent_cart_key", &removed));
    Ok(Json(json!({"removed": removed})))
}

pub async fn cart_clear(State(db): State<Db>, fields: Fields) -> ApiResult {
    let cart_key = fields.require("cart_key")?;
    let remove_sub_carts = fields.flag("remove_sub_carts").unwrap_or(false);
    let mut db = db.write().await;
    ensure_cart(&db.carts, cart_key)?;
    let cleared = if remove_sub_carts {
        subtree(&db.carts, cart_key)
    } else {
        vec![cart_key.to_string()]
    };
    db.articles.retain(|article| !is_under(article, "parent_cart_key", &cleared));
    db.carts
        .retain(|cart| cart["key"] == cart_key || !is_under(cart, "key", &cleared));
    let cart = find(&db.carts, cart_key).cloned().unwrap_or(Value::Null);
    Ok(Json(cart))
}

// --- order ---

pub async fn order_view(State(db): State<Db>, Query(query): QueryPairs) -> ApiResult {
    let fields = Fields(query);
    let order_key = fields.require("order_key")?;
    let db = db.read().await;
    let order = &db.orders[order_position(&db.orders, order_key)?];
    let is_orderable = order.get("billing_address_key").is_some()
        && order.get("email").is_some()
        && order.get("payment_provider").is_some();
    Ok(Json(json!({"order": order, "is_orderable": is_orderable})))
}

pub async fn order_add(State(db): State<Db>, fields: Fields) -> ApiResult {
    let cart_key = fields.require("cart_key")?;
    let mut db = db.write().await;
    let is_root = find(&db.carts, cart_key).is_some_and(|cart| cart["is_root_node"] == true);
    if !is_root {
        return Err(ShopError::bad_request(format!("Invalid cart_key={cart_key}")));
    }
    let mut order = json!({
        "key": new_key("order"),
        "cart_key": cart_key,
        "state_ordered": false,
        "state_paid": false,
        "state_rts": false,
        "state_checkout_in_progress": false,
    });
    set_present(&mut order, &fields, ORDER_FIELDS);
    set_flags(&mut order, &fields, ORDER_FLAGS);
    db.orders.push(order.clone());
    Ok(Json(order))
}

pub async fn order_update(State(db): State<Db>, fields: Fields) -> ApiResult {
    let order_key = fields.require("order_key")?;
    let mut db = db.write().await;
    let index = order_position(&db.orders, order_key)?;
    let order = &mut db.orders[index];
    set_present(order, &fields, ORDER_FIELDS);
    set_flags(order, &fields, ORDER_FLAGS);
    Ok(Json(order.clone()))
}

pub async fn order_remove(State(db): State<Db>, fields: Fields) -> ApiResult {
    let order_key = fields.require("order_key")?;
    let mut db = db.write().await;
    let index = order_position(&db.orders, order_key)?;
    Ok(Json(db.orders.remove(index)))
}

pub async fn payment_providers_list() -> Json<Value> {
    Json(json!({
        "invoice": {"title": "Invoice", "is_available": true},
        "prepayment": {"title": "Prepayment", "is_available": true},
    }))
}

pub async fn checkout_start(State(db): State<Db>, fields: Fields) -> ApiResult {
    let mut db = db.write().await;
    if !db.consume_skey(fields.get("skey").unwrap_or_default()) {
        return Err(ShopError::invalid_skey());
    }
    let order_key = fields.require("order_key")?;
    let index = order_position(&db.orders, order_key)?;
    let order = &mut db.orders[index];
    let Some(provider) = order.get("payment_provider").cloned() else {
        return Err(ShopError::bad_request("Order has no payment_provider"));
    };
    order["state_checkout_in_progress"] = json!(true);
    Ok(Json(json!({"order": order, "payment": {"provider": provider}})))
}

pub async fn checkout_order(State(db): State<Db>, fields: Fields) -> ApiResult {
    let order_key = fields.require("order_key")?;
    let mut db = db.write().await;
    let index = order_position(&db.orders, order_key)?;
    let order = &mut db.orders[index];
    if order["state_checkout_in_progress"] != true {
        return Err(ShopError::bad_request("Checkout has not been started"));
    }
    order["state_ordered"] = json!(true);
    Ok(Json(json!({"order": order})))
}

pub async fn pp_get_settings(State(db): State<Db>, fields: Fields) -> ApiResult {
    let order_key = fields.require("order_key")?;
    let db = db.read().await;
    let order = &db.orders[order_position(&db.orders, order_key)?];
    Ok(Json(json!({
        "payment_provider": order.get("payment_provider"),
        "settings": {},
    })))
}

// --- discount ---

pub async fn discount_add(State(db): State<Db>, fields: Fields) -> ApiResult {
    let code = fields.get("code");
    let discount_key = fields.get("discount_key");
    if code.is_none() && discount_key.is_none() {
        return Err(ShopError::bad_request("Either code or discount_key is required"));
    }
    let mut db = db.write().await;
    let discount = db
        .discounts
        .iter()
        .find(|discount| {
            code.is_some_and(|code| discount["code"] == code)
                || discount_key.is_some_and(|key| discount["key"] == key)
        })
        .cloned()
        .ok_or_else(|| ShopError::not_found("Discount not found"))?;
    let key = discount["key"].as_str().unwrap_or_default().to_string();
    if !db.applied_discounts.contains(&key) {
        db.applied_discounts.push(key);
    }
    Ok(Json(json!({"discount": discount, "applied": true})))
}

pub async fn discount_remove(State(db): State<Db>, fields: Fields) -> ApiResult {
    let discount_key = fields.require("discount_key")?;
    let mut db = db.write().await;
    let index = db
        .applied_discounts
        .iter()
        .position(|key| key == discount_key)
        .ok_or_else(|| ShopError::bad_request("Discount is not applied"))?;
    db.applied_discounts.remove(index);
    Ok(Json(json!({"discount_key": discount_key, "applied": false})))
}

// --- shipping ---

pub async fn shipping_list(State(db): State<Db>, Query(query): QueryPairs) -> ApiResult {
    let fields = Fields(query);
    let cart_key = fields.require("cart_key")?;
    ensure_cart(&db.read().await.carts, cart_key)?;
    Ok(Json(json!([
        {"key": "shipping-standard", "name": "Standard", "shipping_cost": 4.9, "delivery_time": "2-4 days"},
        {"key": "shipping-express", "name": "Express", "shipping_cost": 12.9, "delivery_time": "1 day"},
    ])))
}
