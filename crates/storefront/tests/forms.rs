//! Newsletter and cart mutations report failures inline with a 200.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use wiremock::MockServer;

use beyond_wellness_storefront::analytics::AnalyticsEvent;

use common::{body_text, cart, get, mock_failure, mock_operation, post_form, storefront};

const JSON: &str = "application/json";
const HTML: &str = "text/html";

async fn json_body(response: axum::http::Response<axum::body::Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_newsletter_invalid_email() {
    let server = MockServer::start().await;
    let (_, app) = storefront(&server);

    let response = post_form(&app, "/newsletter", "email=not-an-email", JSON).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Please enter a valid email address.");
}

#[tokio::test]
async fn test_newsletter_invalid_email_fragment() {
    let server = MockServer::start().await;
    let (_, app) = storefront(&server);

    let response = post_form(&app, "/newsletter", "email=", HTML).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("aria-invalid=\"true\""));
    assert!(html.contains("Please enter a valid email address."));
}

#[tokio::test]
async fn test_newsletter_subscribes() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CustomerCreate",
        json!({ "customerCreate": {
            "customer": { "id": "gid://shopify/Customer/1", "email": "fern@example.com" },
            "customerUserErrors": []
        } }),
    )
    .await;
    let (_, app) = storefront(&server);

    let response = post_form(&app, "/newsletter", "email=Fern%40Example.com", JSON).await;
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_newsletter_existing_customer_counts_as_success() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CustomerCreate",
        json!({ "customerCreate": {
            "customer": null,
            "customerUserErrors": [{
                "code": "TAKEN",
                "field": ["input", "email"],
                "message": "Email has already been taken"
            }]
        } }),
    )
    .await;
    let (_, app) = storefront(&server);

    let response = post_form(&app, "/newsletter", "email=fern%40example.com", HTML).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("is on the list"));
}

#[tokio::test]
async fn test_newsletter_platform_failure_is_inline() {
    let server = MockServer::start().await;
    mock_failure(&server, "CustomerCreate", 500).await;
    let (_, app) = storefront(&server);

    let response = post_form(&app, "/newsletter", "email=fern%40example.com", JSON).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_add_to_cart_creates_cart() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CreateCart",
        json!({ "cartCreate": { "cart": cart(2), "userErrors": [] } }),
    )
    .await;
    let (_, app) = storefront(&server);

    let response = post_form(&app, "/cart/add", "variant_id=V2&quantity=2", HTML).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["HX-Trigger"], "cart-updated");
    assert!(response.headers().contains_key("set-cookie"));
    assert_eq!(body_text(response).await.trim(), "2");
}

#[tokio::test]
async fn test_add_to_cart_failure_rolls_back_inline() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CreateCart",
        json!({ "cartCreate": {
            "cart": null,
            "userErrors": [{
                "code": "INVALID",
                "field": ["lines"],
                "message": "Variant is sold out"
            }]
        } }),
    )
    .await;
    let (_, app) = storefront(&server);

    let response = post_form(&app, "/cart/add", "variant_id=V2", HTML).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("HX-Trigger"));
    let html = body_text(response).await;
    assert!(html.contains("class=\"cart-error\""));
    assert!(html.contains("Variant is sold out"));
    assert!(html.contains("data-cart-count=\"0\""));
}

#[tokio::test]
async fn test_update_without_cart_is_inline_error() {
    let server = MockServer::start().await;
    let (_, app) = storefront(&server);

    let response = post_form(
        &app,
        "/cart/update",
        "line_id=gid%3A%2F%2Fshopify%2FCartLine%2Fl1&quantity=3",
        HTML,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("cart-error"));
    assert!(html.contains("Your cart has expired"));
}

#[tokio::test]
async fn test_count_without_session_is_zero() {
    let server = MockServer::start().await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/cart/count").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await.trim(), "0");
}

#[tokio::test]
async fn test_empty_panel_emits_cart_viewed() {
    let server = MockServer::start().await;
    let (state, app) = storefront(&server);
    let mut events = state.analytics().subscribe();

    let response = get(&app, "/cart/panel").await;
    assert_eq!(response.status(), StatusCode::OK);

    match events.try_recv().unwrap() {
        AnalyticsEvent::CartViewed {
            cart,
            prev_cart,
            url,
            ..
        } => {
            assert!(cart.is_none());
            assert!(prev_cart.is_none());
            assert_eq!(url, "http://localhost:3000/cart");
        }
        other => panic!("unexpected event {}", other.name()),
    }
}

#[tokio::test]
async fn test_checkout_without_cart_returns_to_cart_page() {
    let server = MockServer::start().await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/cart");
}
