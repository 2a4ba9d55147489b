//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Home page (streams recommended products)
//! GET  /health                         - Health check
//!
//! # Products
//! GET  /products/{handle}              - Product detail, options in the query string
//! GET  /{locale}/products/{handle}     - Product detail under a `{lang}-{country}` prefix
//!
//! # Cart (fragments)
//! GET  /cart                           - Cart page
//! GET  /cart/panel                     - Cart panel (emits cart_viewed)
//! GET  /cart/count                     - Cart count badge
//! POST /cart/add                       - Add to cart (returns badge, triggers cart-updated)
//! POST /cart/update                    - Update quantity (returns cart_items fragment)
//! POST /cart/remove                    - Remove line (returns cart_items fragment)
//!
//! # Checkout
//! GET  /checkout                       - Redirect to Shopify checkout
//!
//! # Newsletter (rate limited)
//! POST /newsletter                     - Subscribe; JSON or fragment
//! ```

pub mod cart;
pub mod home;
pub mod newsletter;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::newsletter_rate_limiter;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/panel", get(cart::panel))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .route("/products/{handle}", get(products::show))
        .route("/{locale}/products/{handle}", get(products::show_localized))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout redirect
        .route("/checkout", get(cart::checkout))
        // Newsletter
        .route(
            "/newsletter",
            post(newsletter::subscribe).layer(newsletter_rate_limiter()),
        )
}
