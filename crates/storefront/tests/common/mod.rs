//! Shared fixtures: a wiremock Shopify endpoint and the real router.

#![allow(dead_code, clippy::unwrap_used)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use beyond_wellness_storefront::{
    app,
    config::{LocaleConfig, SentryConfig, ShopifyStorefrontConfig, StorefrontConfig},
    state::AppState,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Storefront configuration pointed at `server`.
pub fn config(server: &MockServer) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        shopify: ShopifyStorefrontConfig {
            store: "beyond-wellness.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from("3f9c1a7be20d64c58e1b7f2a9d0c6e4b"),
            endpoint_override: Some(format!("{}/graphql.json", server.uri())),
            shop_id: Some("gid://shopify/Shop/1".to_string()),
            cache_ttl: Duration::from_secs(60),
        },
        locale: LocaleConfig::default(),
        sentry: SentryConfig::default(),
    }
}

/// App state and router backed by `server`.
pub fn storefront(server: &MockServer) -> (AppState, Router) {
    let state = AppState::new(config(server));
    (state.clone(), app(state))
}

/// Answer `operation` with `data`.
pub async fn mock_operation(server: &MockServer, operation: &str, data: Value) {
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

/// Fail `operation` with an HTTP error.
pub async fn mock_failure(server: &MockServer, operation: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(server)
        .await;
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: &Router, uri: &str, body: &str, accept: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .header("accept", accept)
                .header("x-forwarded-for", "203.0.113.10")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn money(amount: &str) -> Value {
    json!({ "amount": amount, "currencyCode": "USD" })
}

pub fn variant(id: &str, color: &str, available: bool) -> Value {
    json!({
        "id": id,
        "title": color,
        "availableForSale": available,
        "sku": null,
        "price": money("24.0"),
        "compareAtPrice": null,
        "selectedOptions": [{ "name": "Color", "value": color }],
        "image": null
    })
}

/// The "widget" product: Red (V1) and Blue (V2).
pub fn widget(variants: Vec<Value>) -> Value {
    json!({
        "product": {
            "id": "gid://shopify/Product/1",
            "title": "Widget",
            "vendor": "Beyond Wellness",
            "handle": "widget",
            "description": "A widget.",
            "descriptionHtml": "<p>A widget.</p>",
            "tags": [],
            "seo": { "title": null, "description": null },
            "priceRange": {
                "minVariantPrice": money("24.0"),
                "maxVariantPrice": money("24.0")
            },
            "options": [{
                "name": "Color",
                "optionValues": [{ "name": "Red" }, { "name": "Blue" }]
            }],
            "images": { "nodes": [] },
            "selectedVariant": null,
            "variants": { "nodes": variants }
        }
    })
}

pub fn widget_variants() -> Vec<Value> {
    vec![variant("V1", "Red", true), variant("V2", "Blue", true)]
}

pub fn product_card(handle: &str, title: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{handle}"),
        "title": title,
        "handle": handle,
        "priceRange": { "minVariantPrice": money("18.0") },
        "featuredImage": null
    })
}

pub fn cart(quantity: i64) -> Value {
    json!({
        "id": "gid://shopify/Cart/c1",
        "checkoutUrl": "https://beyond-wellness.myshopify.com/cart/c/c1",
        "totalQuantity": quantity,
        "cost": {
            "subtotalAmount": money("48.0"),
            "totalAmount": money("48.0")
        },
        "lines": { "nodes": [{
            "id": "gid://shopify/CartLine/l1",
            "quantity": quantity,
            "cost": {
                "amountPerQuantity": money("24.0"),
                "totalAmount": money("48.0")
            },
            "merchandise": {
                "id": "V2",
                "title": "Blue",
                "selectedOptions": [{ "name": "Color", "value": "Blue" }],
                "image": null,
                "product": { "handle": "widget", "title": "Widget" }
            }
        }] }
    })
}
