//! Home page route handler.
//!
//! The featured collection and the product grid are critical; the
//! recommended products stream in after the shell.

use askama::Template;
use axum::extract::Query;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::context::{I18n, LoaderContext};
use crate::error::{AppError, Result};
use crate::filters;
use crate::loader::{Deferred, StreamedPage, render_section};
use crate::middleware::CspNonce;
use crate::shopify::{Collection, ProductSummary};

use super::cart::badge_count;

/// Products shown in the home page grid.
pub const ALL_PRODUCTS_PAGE_SIZE: i64 = 250;

/// Id of the recommended products placeholder.
const RECOMMENDED_SECTION: &str = "recommended-products";

/// Brand values scrolling across the marquee.
const MARQUEE_ITEMS: &[&str] = &[
    "Plant powered",
    "Small batch",
    "Cruelty free",
    "Grown with care",
    "Be well",
];

// =============================================================================
// View Types
// =============================================================================

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub title: String,
    pub url: String,
    pub price: String,
    pub image_url: Option<String>,
    pub image_alt: String,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &ProductSummary, i18n: &I18n) -> Self {
        Self {
            title: product.title.clone(),
            url: i18n.localize(&format!("/products/{}", product.handle)),
            price: filters::format_money(&product.min_price),
            image_url: product.featured_image.as_ref().map(|img| img.url.clone()),
            image_alt: product
                .featured_image
                .as_ref()
                .and_then(|img| img.alt_text.clone())
                .unwrap_or_else(|| product.title.clone()),
        }
    }
}

/// Featured collection banner.
#[derive(Clone)]
pub struct CollectionView {
    pub title: String,
    pub image_url: Option<String>,
    pub image_alt: String,
}

impl From<&Collection> for CollectionView {
    fn from(collection: &Collection) -> Self {
        Self {
            title: collection.title.clone(),
            image_url: collection.image.as_ref().map(|img| img.url.clone()),
            image_alt: collection
                .image
                .as_ref()
                .and_then(|img| img.alt_text.clone())
                .unwrap_or_else(|| collection.title.clone()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Home page shell.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nonce: String,
    pub page_title: String,
    pub cart_count: u32,
    pub featured: Option<CollectionView>,
    pub products: Vec<ProductCardView>,
    pub next_page_url: Option<String>,
    pub marquee: &'static [&'static str],
}

/// Product grid, streamed into the recommended products section.
#[derive(Template)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub products: Vec<ProductCardView>,
}

/// Pagination cursor for the product grid.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub after: Option<String>,
}

// =============================================================================
// Handler
// =============================================================================

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(
    ctx: LoaderContext,
    session: Session,
    nonce: CspNonce,
    Query(query): Query<HomeQuery>,
) -> Result<StreamedPage> {
    let recommended = {
        let storefront = ctx.storefront.clone();
        let locale = ctx.locale().clone();
        Deferred::spawn("recommended_products", async move {
            storefront.recommended_products(&locale).await
        })
    };

    let (featured, page) = tokio::try_join!(
        ctx.storefront.featured_collection(ctx.locale()),
        ctx.storefront
            .all_products(ctx.locale(), ALL_PRODUCTS_PAGE_SIZE, query.after),
    )
    .map_err(AppError::from_shopify)?;

    let next_page_url = page
        .page_info
        .end_cursor
        .as_ref()
        .filter(|_| page.page_info.has_next_page)
        .map(|cursor| {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("after", cursor)
                .finish();
            format!("{}?{query}", ctx.i18n.localize("/"))
        });

    let shell = HomeTemplate {
        nonce: nonce.value().to_string(),
        page_title: "Beyond Wellness | Be Well".to_string(),
        cart_count: badge_count(&session).await,
        featured: featured.as_ref().map(CollectionView::from),
        products: page
            .products
            .iter()
            .map(|p| ProductCardView::new(p, &ctx.i18n))
            .collect(),
        next_page_url,
        marquee: MARQUEE_ITEMS,
    };

    let i18n = ctx.i18n.clone();
    Ok(StreamedPage::new(&shell, nonce)?.section(
        RECOMMENDED_SECTION,
        recommended,
        move |products| {
            render_section(&ProductGridTemplate {
                products: products
                    .unwrap_or_default()
                    .iter()
                    .map(|p| ProductCardView::new(p, &i18n))
                    .collect(),
            })
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::{Image, Locale, Money};

    fn summary() -> ProductSummary {
        ProductSummary {
            id: "gid://shopify/Product/1".to_string(),
            handle: "rose-balm".to_string(),
            title: "Rose Balm".to_string(),
            min_price: Money {
                amount: "18.0".to_string(),
                currency_code: "USD".to_string(),
            },
            featured_image: Some(Image {
                id: None,
                url: "https://cdn.shopify.com/rose.jpg".to_string(),
                alt_text: None,
                width: None,
                height: None,
            }),
        }
    }

    #[test]
    fn test_product_card_localizes_url() {
        let i18n = I18n::from_path("/en-ca/products/x", &Locale::new("US", "EN"));
        let card = ProductCardView::new(&summary(), &i18n);
        assert_eq!(card.url, "/en-ca/products/rose-balm");
        assert_eq!(card.price, "$18.00");
        assert_eq!(card.image_alt, "Rose Balm");
    }

    #[test]
    fn test_empty_grid_renders() {
        let html = ProductGridTemplate { products: vec![] }.render();
        assert!(html.is_ok());
    }
}
