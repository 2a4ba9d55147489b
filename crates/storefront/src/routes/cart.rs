//! Cart route handlers.
//!
//! Shopify owns the cart; the session keeps its ID and the last snapshot the
//! storefront saw. Mutations go through [`OptimisticCart`]: the expected
//! effect is projected while Shopify works, Shopify's answer replaces it, and
//! a failure rolls back to the stored snapshot with an inline message.

use std::future::Future;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use beyond_wellness_core::{CartDelta, CartLineSnapshot, CartSnapshot, OptimisticCart};

use crate::analytics::AnalyticsEvent;
use crate::context::{I18n, LoaderContext};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::session::keys;
use crate::shopify::{Cart, CartLine, CartLineInput, CartLineUpdateInput, ShopifyError};
use crate::variants::is_default_selection;

/// Tells client scripts to refresh cart chrome.
const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub url: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

impl CartItemView {
    fn new(line: &CartLine, i18n: &I18n) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.clone(),
            url: i18n.localize(&format!("/products/{}", merchandise.product.handle)),
            title: merchandise.product.title.clone(),
            variant_title: (!is_default_selection(&merchandise.selected_options))
                .then(|| merchandise.title.clone()),
            quantity: u32::try_from(line.quantity).unwrap_or(0),
            price: filters::format_money(&line.cost.amount_per_quantity),
            line_price: filters::format_money(&line.cost.total_amount),
            image_url: merchandise.image.as_ref().map(|img| img.url.clone()),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: "$0.00".to_string(),
            item_count: 0,
        }
    }

    #[must_use]
    pub fn new(cart: &Cart, i18n: &I18n) -> Self {
        Self {
            items: cart
                .lines
                .iter()
                .map(|line| CartItemView::new(line, i18n))
                .collect(),
            subtotal: filters::format_money(&cart.cost.subtotal),
            item_count: u32::try_from(cart.total_quantity).unwrap_or(0),
        }
    }
}

/// Snapshot of a Shopify cart for the session and analytics.
#[must_use]
pub fn snapshot_of(cart: &Cart) -> CartSnapshot {
    CartSnapshot {
        id: Some(cart.id.clone()),
        lines: cart
            .lines
            .iter()
            .map(|line| CartLineSnapshot {
                line_id: Some(line.id.clone()),
                merchandise_id: line.merchandise.id.clone(),
                quantity: u32::try_from(line.quantity).unwrap_or(0),
            })
            .collect(),
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn cart_id(session: &Session) -> Option<String> {
    session.get::<String>(keys::CART_ID).await.ok().flatten()
}

/// The last cart snapshot stored in the session.
pub async fn stored_snapshot(session: &Session) -> CartSnapshot {
    session
        .get::<CartSnapshot>(keys::CART_SNAPSHOT)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Item count for the header badge, without calling Shopify.
pub async fn badge_count(session: &Session) -> u32 {
    stored_snapshot(session).await.total_quantity()
}

/// Store Shopify's cart as the session's authoritative snapshot.
async fn remember(session: &Session, snapshot: &CartSnapshot) {
    if let Some(id) = &snapshot.id
        && let Err(e) = session.insert(keys::CART_ID, id).await
    {
        tracing::error!(error = %e, "Failed to save cart ID to session");
    }
    if let Err(e) = session.insert(keys::CART_SNAPSHOT, snapshot).await {
        tracing::error!(error = %e, "Failed to save cart snapshot to session");
    }
}

/// Drop a cart Shopify no longer knows about.
async fn forget(session: &Session) {
    if let Err(e) = session.remove::<String>(keys::CART_ID).await {
        tracing::warn!(error = %e, "Failed to clear cart ID");
    }
    if let Err(e) = session.remove::<CartSnapshot>(keys::CART_SNAPSHOT).await {
        tracing::warn!(error = %e, "Failed to clear cart snapshot");
    }
}

/// Fetch the session's cart. An expired cart is forgotten and reads as empty.
async fn load_cart(ctx: &LoaderContext, session: &Session) -> Result<Option<Cart>> {
    let Some(id) = cart_id(session).await else {
        return Ok(None);
    };

    match ctx.storefront.get_cart(ctx.locale(), &id).await {
        Ok(cart) => {
            remember(session, &snapshot_of(&cart)).await;
            Ok(Some(cart))
        }
        Err(ShopifyError::NotFound(_)) => {
            tracing::info!(cart_id = %id, "Cart expired");
            forget(session).await;
            Ok(None)
        }
        Err(e) => Err(AppError::Shopify(e)),
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nonce: String,
    pub page_title: String,
    pub cart_count: u32,
    pub cart: CartView,
}

/// Cart panel fragment, shown in the header aside.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_panel.html")]
pub struct CartPanelTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart items fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline error after a failed cart mutation.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: String,
    /// Badge count after rolling back.
    pub count: u32,
}

// =============================================================================
// Mutations
// =============================================================================

/// Run a cart mutation through the optimistic projection.
///
/// `run` receives the session's cart ID. On success the session snapshot is
/// replaced by Shopify's cart; on failure it is left as it was.
async fn mutate<F, Fut>(
    session: &Session,
    delta: CartDelta,
    run: F,
) -> std::result::Result<Cart, CartErrorTemplate>
where
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = std::result::Result<Cart, ShopifyError>>,
{
    let mut cart = OptimisticCart::new(stored_snapshot(session).await);
    if let Err(e) = cart.begin(delta) {
        tracing::error!(error = %e, "Cart mutation out of order");
    }
    tracing::debug!(
        projected_quantity = cart.projection().total_quantity(),
        "Cart mutation pending"
    );

    match run(cart_id(session).await).await {
        Ok(server_cart) => {
            cart.confirm(snapshot_of(&server_cart));
            remember(session, cart.authoritative()).await;
            Ok(server_cart)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cart mutation failed");
            if let Err(rollback) = cart.rollback() {
                tracing::error!(error = %rollback, "Cart rollback out of order");
            }
            let message = match e {
                ShopifyError::UserError(message) => message,
                ShopifyError::NotFound(_) => {
                    forget(session).await;
                    return Err(CartErrorTemplate {
                        message: "Your cart has expired. Please add the item again.".to_string(),
                        count: 0,
                    });
                }
                _ => "We couldn't update your cart. Please try again.".to_string(),
            };
            Err(CartErrorTemplate {
                message,
                count: cart.projection().total_quantity(),
            })
        }
    }
}

/// Add item to cart.
///
/// Creates a new cart if the session has none. Returns the count badge.
#[instrument(skip(ctx, session))]
pub async fn add(
    ctx: LoaderContext,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let quantity = form.quantity.unwrap_or(1).max(1);
    add_breadcrumb(
        "cart",
        "Add line",
        Some(&[("variant_id", form.variant_id.as_str())]),
    );

    let delta = CartDelta::AddLine {
        merchandise_id: form.variant_id.clone(),
        quantity,
    };
    let line = CartLineInput {
        merchandise_id: form.variant_id,
        quantity: i64::from(quantity),
    };

    let (storefront, locale) = (&ctx.storefront, ctx.locale());
    let result = mutate(&session, delta, |id| async move {
        match id {
            Some(id) => storefront.add_to_cart(locale, &id, vec![line]).await,
            None => storefront.create_cart(locale, vec![line]).await,
        }
    })
    .await;

    match result {
        Ok(cart) => (
            AppendHeaders([CART_UPDATED_TRIGGER]),
            CartCountTemplate {
                count: u32::try_from(cart.total_quantity).unwrap_or(0),
            },
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

/// Update cart line quantity. Zero removes the line.
#[instrument(skip(ctx, session))]
pub async fn update(
    ctx: LoaderContext,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let delta = CartDelta::UpdateQuantity {
        line_id: form.line_id.clone(),
        quantity: form.quantity,
    };
    let line = CartLineUpdateInput {
        id: form.line_id,
        quantity: i64::from(form.quantity),
    };

    let (storefront, locale) = (&ctx.storefront, ctx.locale());
    let result = mutate(&session, delta, |id| async move {
        let id = id.ok_or_else(|| ShopifyError::NotFound("cart".to_string()))?;
        storefront.update_cart(locale, &id, vec![line]).await
    })
    .await;

    items_response(result, &ctx.i18n)
}

/// Remove a cart line.
#[instrument(skip(ctx, session))]
pub async fn remove(
    ctx: LoaderContext,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let delta = CartDelta::RemoveLine {
        line_id: form.line_id.clone(),
    };

    let (storefront, locale) = (&ctx.storefront, ctx.locale());
    let result = mutate(&session, delta, |id| async move {
        let id = id.ok_or_else(|| ShopifyError::NotFound("cart".to_string()))?;
        storefront
            .remove_from_cart(locale, &id, vec![form.line_id])
            .await
    })
    .await;

    items_response(result, &ctx.i18n)
}

fn items_response(result: std::result::Result<Cart, CartErrorTemplate>, i18n: &I18n) -> Response {
    match result {
        Ok(cart) => (
            AppendHeaders([CART_UPDATED_TRIGGER]),
            CartItemsTemplate {
                cart: CartView::new(&cart, i18n),
            },
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}

// =============================================================================
// Reads
// =============================================================================

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(ctx: LoaderContext, session: Session, nonce: CspNonce) -> Result<Response> {
    let cart = load_cart(&ctx, &session)
        .await?
        .map_or_else(CartView::empty, |cart| CartView::new(&cart, &ctx.i18n));

    Ok(CartShowTemplate {
        nonce: nonce.value().to_string(),
        page_title: "Beyond Wellness | Cart".to_string(),
        cart_count: cart.item_count,
        cart,
    }
    .into_response())
}

/// Cart panel fragment. Opening it emits `cart_viewed`.
#[instrument(skip_all)]
pub async fn panel(ctx: LoaderContext, session: Session, headers: HeaderMap) -> Response {
    let (cart, error) = match load_cart(&ctx, &session).await {
        Ok(cart) => (cart, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart panel");
            (
                None,
                Some("We couldn't load your cart. Please try again.".to_string()),
            )
        }
    };

    let snapshot = cart.as_ref().map(snapshot_of);
    let prev_cart = session
        .get::<CartSnapshot>(keys::LAST_VIEWED_CART)
        .await
        .ok()
        .flatten();
    if let Some(current) = &snapshot
        && let Err(e) = session.insert(keys::LAST_VIEWED_CART, current).await
    {
        tracing::warn!(error = %e, "Failed to save last viewed cart");
    }

    let url = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| ctx.absolute_url("/cart"), ToString::to_string);
    let currency = cart.as_ref().map(|c| c.cost.total.currency_code.as_str());
    ctx.analytics.publish(AnalyticsEvent::CartViewed {
        cart: snapshot,
        prev_cart,
        shop: ctx.shop(currency),
        url,
    });

    CartPanelTemplate {
        cart: cart.map_or_else(CartView::empty, |cart| CartView::new(&cart, &ctx.i18n)),
        error,
    }
    .into_response()
}

/// Cart count badge. Falls back to the stored snapshot if Shopify fails.
#[instrument(skip_all)]
pub async fn count(ctx: LoaderContext, session: Session) -> impl IntoResponse {
    let count = match load_cart(&ctx, &session).await {
        Ok(cart) => cart.map_or(0, |cart| u32::try_from(cart.total_quantity).unwrap_or(0)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to refresh cart count");
            badge_count(&session).await
        }
    };

    CartCountTemplate { count }
}

/// Redirect to Shopify checkout.
#[instrument(skip_all)]
pub async fn checkout(ctx: LoaderContext, session: Session) -> Response {
    match load_cart(&ctx, &session).await {
        Ok(Some(cart)) if !cart.lines.is_empty() => {
            Redirect::to(&cart.checkout_url).into_response()
        }
        Ok(_) => Redirect::to("/cart").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to get cart for checkout");
            Redirect::to("/cart").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::{
        CartCost, CartLineCost, CartMerchandise, CartMerchandiseProduct, Locale, Money,
        SelectedOption,
    };

    fn usd(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn cart() -> Cart {
        Cart {
            id: "gid://shopify/Cart/c1".to_string(),
            checkout_url: "https://shop.example/checkout/c1".to_string(),
            total_quantity: 3,
            cost: CartCost {
                subtotal: usd("54.0"),
                total: usd("54.0"),
            },
            lines: vec![CartLine {
                id: "gid://shopify/CartLine/l1".to_string(),
                quantity: 3,
                cost: CartLineCost {
                    amount_per_quantity: usd("18.0"),
                    total_amount: usd("54.0"),
                },
                merchandise: CartMerchandise {
                    id: "gid://shopify/ProductVariant/v1".to_string(),
                    title: "Default Title".to_string(),
                    selected_options: vec![SelectedOption::new("Title", "Default Title")],
                    image: None,
                    product: CartMerchandiseProduct {
                        handle: "rose-balm".to_string(),
                        title: "Rose Balm".to_string(),
                    },
                },
            }],
        }
    }

    #[test]
    fn test_snapshot_of_cart() {
        let snapshot = snapshot_of(&cart());
        assert_eq!(snapshot.id.as_deref(), Some("gid://shopify/Cart/c1"));
        assert_eq!(snapshot.total_quantity(), 3);
        assert_eq!(
            snapshot.lines[0].line_id.as_deref(),
            Some("gid://shopify/CartLine/l1")
        );
    }

    #[test]
    fn test_cart_view_hides_default_variant_title() {
        let i18n = I18n::from_path("/", &Locale::new("US", "EN"));
        let view = CartView::new(&cart(), &i18n);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$54.00");
        assert_eq!(view.items[0].variant_title, None);
        assert_eq!(view.items[0].url, "/products/rose-balm");
        assert_eq!(view.items[0].line_price, "$54.00");
    }

    #[test]
    fn test_error_fragment_renders_message() {
        let html = CartErrorTemplate {
            message: "Only 2 left".to_string(),
            count: 1,
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("Only 2 left"));
    }
}
