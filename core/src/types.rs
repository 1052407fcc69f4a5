//! Argument types for the shop endpoints.
//!
//! # Design
//! Entities themselves (carts, articles, addresses, orders) stay opaque
//! `serde_json::Value`s; only the arguments the client sends are typed.
//! Every optional field is an `Option`: `None` means "do not send", any
//! `Some` value is sent, even when empty or zero. Each type knows how to turn
//! itself into `FormFields` in the order the backend documents them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::{FormFields, ParamValue};

macro_rules! backend_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for ParamValue {
            fn from(value: $name) -> Self {
                ParamValue::Single(value.as_str().to_string())
            }
        }
    };
}

backend_enum!(
    /// How `quantity` is applied to an article already in a cart.
    QuantityMode { Replace => "replace", Increase => "increase", Decrease => "decrease" }
);

backend_enum!(CartType { Wishlist => "wishlist", Basket => "basket" });

backend_enum!(CustomerType { Private => "private", Business => "business" });

backend_enum!(Salutation { Female => "female", Male => "male", Other => "other" });

backend_enum!(AddressType { Billing => "billing", Shipping => "shipping" });

impl Default for QuantityMode {
    fn default() -> Self {
        QuantityMode::Increase
    }
}

/// Identifies an article inside a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleKeys {
    pub article_key: String,
    pub parent_cart_key: String,
}

impl ArticleKeys {
    pub fn new(article_key: impl Into<String>, parent_cart_key: impl Into<String>) -> Self {
        Self {
            article_key: article_key.into(),
            parent_cart_key: parent_cart_key.into(),
        }
    }

    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .field("article_key", &self.article_key)
            .field("parent_cart_key", &self.parent_cart_key)
    }
}

/// Arguments of `article_add` and `article_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleQuantity {
    pub article_key: String,
    pub parent_cart_key: String,
    pub quantity: u32,
    pub quantity_mode: QuantityMode,
}

impl ArticleQuantity {
    /// One piece, increasing the current quantity.
    pub fn new(article_key: impl Into<String>, parent_cart_key: impl Into<String>) -> Self {
        Self {
            article_key: article_key.into(),
            parent_cart_key: parent_cart_key.into(),
            quantity: 1,
            quantity_mode: QuantityMode::Increase,
        }
    }

    pub fn quantity(mut self, quantity: u32, mode: QuantityMode) -> Self {
        self.quantity = quantity;
        self.quantity_mode = mode;
        self
    }

    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .field("article_key", &self.article_key)
            .field("parent_cart_key", &self.parent_cart_key)
            .field("quantity", self.quantity)
            .field("quantity_mode", self.quantity_mode)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMove {
    pub article_key: String,
    pub parent_cart_key: String,
    pub new_parent_cart_key: String,
}

impl ArticleMove {
    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .field("article_key", &self.article_key)
            .field("parent_cart_key", &self.parent_cart_key)
            .field("new_parent_cart_key", &self.new_parent_cart_key)
    }
}

/// Arguments of `cart_add`. All fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartAdd {
    pub parent_cart_key: Option<String>,
    pub name: Option<String>,
    pub cart_type: Option<CartType>,
    pub customer_comment: Option<String>,
    pub shipping_address_key: Option<String>,
    pub shipping_key: Option<String>,
    pub discount_key: Option<String>,
}

impl CartAdd {
    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .optional("parent_cart_key", self.parent_cart_key.as_ref())
            .optional("name", self.name.as_ref())
            .optional("cart_type", self.cart_type)
            .optional("customer_comment", self.customer_comment.as_ref())
            .optional("shipping_address_key", self.shipping_address_key.as_ref())
            .optional("shipping_key", self.shipping_key.as_ref())
            .optional("discount_key", self.discount_key.as_ref())
    }
}

/// Arguments of `cart_update`: the cart to change plus the `CartAdd` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub cart_key: String,
    #[serde(flatten)]
    pub changes: CartAdd,
}

impl CartUpdate {
    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .field("cart_key", &self.cart_key)
            .merge(self.changes.to_fields())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartClear {
    pub cart_key: String,
    pub remove_sub_carts: Option<bool>,
}

impl CartClear {
    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .field("cart_key", &self.cart_key)
            .optional("remove_sub_carts", self.remove_sub_carts)
    }
}

/// Arguments of `address_add`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressAdd {
    pub customer_type: Option<CustomerType>,
    pub salutation: Option<Salutation>,
    pub company_name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub street_name: Option<String>,
    pub street_number: Option<String>,
    pub address_addition: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub customer_key: Option<String>,
    pub is_default: Option<bool>,
    /// An address may serve as billing and shipping address at once.
    pub address_type: Option<Vec<AddressType>>,
}

impl AddressAdd {
    /// The address module names the customer relation `customer`.
    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .optional("customer_type", self.customer_type)
            .optional("salutation", self.salutation)
            .optional("company_name", self.company_name.as_ref())
            .optional("firstname", self.firstname.as_ref())
            .optional("lastname", self.lastname.as_ref())
            .optional("street_name", self.street_name.as_ref())
            .optional("street_number", self.street_number.as_ref())
            .optional("address_addition", self.address_addition.as_ref())
            .optional("zip_code", self.zip_code.as_ref())
            .optional("city", self.city.as_ref())
            .optional("country", self.country.as_ref())
            .optional("customer", self.customer_key.as_ref())
            .optional("is_default", self.is_default)
            .optional(
                "address_type",
                self.address_type
                    .as_ref()
                    .map(|types| ParamValue::many(types.iter().map(|t| t.as_str()))),
            )
    }
}

/// Order fields shared by `order_add` and `order_update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFields {
    pub payment_provider: Option<String>,
    pub billing_address_key: Option<String>,
    pub email: Option<String>,
    pub customer_key: Option<String>,
    pub state_ordered: Option<bool>,
    pub state_paid: Option<bool>,
    pub state_rts: Option<bool>,
}

impl OrderFields {
    fn append_to(&self, fields: FormFields) -> FormFields {
        fields
            .optional("payment_provider", self.payment_provider.as_ref())
            .optional("billing_address_key", self.billing_address_key.as_ref())
            .optional("email", self.email.as_ref())
            .optional("customer_key", self.customer_key.as_ref())
            .optional("state_ordered", self.state_ordered)
            .optional("state_paid", self.state_paid)
            .optional("state_rts", self.state_rts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAdd {
    pub cart_key: Option<String>,
    #[serde(flatten)]
    pub fields: OrderFields,
}

impl OrderAdd {
    pub fn to_fields(&self) -> FormFields {
        self.fields
            .append_to(FormFields::new().optional("cart_key", self.cart_key.as_ref()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_key: Option<String>,
    #[serde(flatten)]
    pub fields: OrderFields,
}

impl OrderUpdate {
    pub fn to_fields(&self) -> FormFields {
        self.fields
            .append_to(FormFields::new().optional("order_key", self.order_key.as_ref()))
    }
}

/// A discount is added either by `code` or by `discount_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountAdd {
    pub code: Option<String>,
    pub discount_key: Option<String>,
}

impl DiscountAdd {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            discount_key: None,
        }
    }

    pub fn to_fields(&self) -> FormFields {
        FormFields::new()
            .optional("code", self.code.as_ref())
            .optional("discount_key", self.discount_key.as_ref())
    }
}
