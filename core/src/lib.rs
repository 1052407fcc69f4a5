//! Async HTTP client for the ViUR shop backend.
//!
//! # Overview
//! `request::build_request` turns a url and a `RequestConfig` into an
//! `HttpRequest` without touching the network; a `Transport` executes it and
//! `request::check_response` maps non-2xx statuses to `HttpError`.
//! `ShopClient` layers one method per shop endpoint on top.
//!
//! # Design
//! - `ShopClient` is stateless apart from its `ShopConfig` and transport.
//! - Parameter shapes are explicit (`Params`), never sniffed at runtime.
//! - Transports are pluggable: reqwest (async, default) and ureq (blocking)
//!   backends ship behind features, tests script their own.
//! - Entities are opaque `serde_json::Value`s; only arguments are typed.

pub mod backends;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod notify;
pub mod params;
pub mod request;
pub mod transport;
pub mod types;

pub use client::ShopClient;
pub use config::ShopConfig;
pub use error::{ApiError, HttpError, ShopError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use notify::{error_notice, present_error, Notifier, StderrNotifier};
pub use params::{FormData, FormFields, ParamValue, Params};
pub use request::{build_request, check_response, issue, RequestConfig};
pub use transport::Transport;
pub use types::{
    AddressAdd, AddressType, ArticleKeys, ArticleMove, ArticleQuantity, CartAdd, CartClear,
    CartType, CartUpdate, CustomerType, DiscountAdd, OrderAdd, OrderFields, OrderUpdate,
    QuantityMode, Salutation,
};
