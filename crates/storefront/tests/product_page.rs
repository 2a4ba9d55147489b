//! Product page: variant resolution, redirects, and critical/deferred loads.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::{StatusCode, header};
use beyond_wellness_storefront::analytics::AnalyticsEvent;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    body_text, get, mock_failure, mock_operation, storefront, variant, widget, widget_variants,
};

async fn widget_server() -> MockServer {
    let server = MockServer::start().await;
    mock_operation(&server, "ProductByHandle", widget(widget_variants())).await;
    mock_operation(
        &server,
        "ProductVariants",
        json!({ "product": { "variants": { "nodes": widget_variants() } } }),
    )
    .await;
    server
}

#[tokio::test]
async fn test_complete_selection_renders_variant() {
    let server = widget_server().await;
    let (state, app) = storefront(&server);
    let mut events = state.analytics().subscribe();

    let response = get(&app, "/products/widget?Color=Blue").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );

    let html = body_text(response).await;
    assert!(html.contains("<title>Beyond Wellness | Widget</title>"));
    assert!(html.contains("value=\"V2\""));
    assert!(html.contains("<template id=\"product-options-content\">"));
    assert!(html.trim_end().ends_with("</html>"));

    match events.try_recv().unwrap() {
        AnalyticsEvent::ProductViewed { products, url, .. } => {
            assert_eq!(products[0].variant_id, "V2");
            assert_eq!(products[0].quantity, 1);
            assert_eq!(url, "http://localhost:3000/products/widget?Color=Blue");
        }
        other => panic!("unexpected event {}", other.name()),
    }
}

#[tokio::test]
async fn test_missing_selection_redirects_to_first_variant() {
    let server = widget_server().await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/widget").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/products/widget?Color=Red"
    );
}

#[tokio::test]
async fn test_invalid_selection_redirect_keeps_other_params() {
    let server = widget_server().await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/widget?utm_source=mail&Color=Green").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/products/widget?utm_source=mail&Color=Red"
    );
}

#[tokio::test]
async fn test_lowercase_option_redirect_lands_on_variant() {
    let server = widget_server().await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/widget?color=green").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(location, "/products/widget?Color=Red");

    let response = get(&app, &location).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("value=\"V1\""));
}

#[tokio::test]
async fn test_locale_prefix_sets_context_and_survives_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "operationName": "ProductByHandle",
            "variables": { "country": "CA", "language": "FR" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": widget(widget_variants()) })),
        )
        .mount(&server)
        .await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/fr-ca/products/widget").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/fr-ca/products/widget?Color=Red"
    );
}

#[tokio::test]
async fn test_unknown_locale_segment_is_not_found() {
    let server = widget_server().await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/garden/products/widget?Color=Red").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_default_variant_renders_without_redirect() {
    let server = MockServer::start().await;
    let mut default = variant("V9", "Default Title", true);
    default["selectedOptions"] = json!([{ "name": "Title", "value": "Default Title" }]);
    mock_operation(&server, "ProductByHandle", widget(vec![default])).await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/widget").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("value=\"V9\""));
}

#[tokio::test]
async fn test_critical_failure_is_bad_gateway_without_html() {
    let server = MockServer::start().await;
    mock_failure(&server, "ProductByHandle", 500).await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/widget?Color=Blue").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_text(response).await;
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn test_deferred_failure_keeps_page_and_critical_picker() {
    let server = MockServer::start().await;
    mock_operation(&server, "ProductByHandle", widget(widget_variants())).await;
    mock_failure(&server, "ProductVariants", 500).await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/widget?Color=Blue").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    let section = html
        .split("<template id=\"product-options-content\">")
        .nth(1)
        .unwrap();
    assert!(section.contains("value=\"V2\""));
    assert!(section.contains("/products/widget?Color=Red"));
}

#[tokio::test]
async fn test_full_variant_list_updates_availability() {
    let server = MockServer::start().await;
    mock_operation(&server, "ProductByHandle", widget(widget_variants())).await;
    mock_operation(
        &server,
        "ProductVariants",
        json!({ "product": { "variants": { "nodes": [
            variant("V1", "Red", true),
            variant("V2", "Blue", false)
        ] } } }),
    )
    .await;
    let (_, app) = storefront(&server);

    let html = body_text(get(&app, "/products/widget?Color=Blue").await).await;
    let section = html
        .split("<template id=\"product-options-content\">")
        .nth(1)
        .unwrap();
    assert!(section.contains("Sold out"));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let server = MockServer::start().await;
    mock_operation(&server, "ProductByHandle", json!({ "product": null })).await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_without_variants_is_not_found() {
    let server = MockServer::start().await;
    mock_operation(&server, "ProductByHandle", widget(vec![])).await;
    let (_, app) = storefront(&server);

    let response = get(&app, "/products/widget").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
