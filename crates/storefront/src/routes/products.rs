//! Product route handlers.
//!
//! The product with up to [`CRITICAL_VARIANT_COUNT`] variants is critical.
//! The full variant list is deferred; when it settles the option picker is
//! rebuilt with its availability and the selected variant is reconciled
//! against it.
//!
//! [`CRITICAL_VARIANT_COUNT`]: crate::shopify::CRITICAL_VARIANT_COUNT

use askama::Template;
use axum::{
    extract::Path,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::analytics::{AnalyticsEvent, ProductViewPayload};
use crate::context::LoaderContext;
use crate::error::{AppError, Result};
use crate::filters;
use crate::loader::{Deferred, StreamedPage, render_section};
use crate::middleware::CspNonce;
use crate::shopify::{Image, Product, ProductVariant};
use crate::variants::{
    OptionPicker, VariantSelection, option_pickers, reconcile_selected_variant, resolve,
    selected_options_from_query,
};

use super::cart::badge_count;

/// Id of the option picker placeholder.
const OPTIONS_SECTION: &str = "product-options";

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl ImageView {
    fn new(image: &Image, fallback_alt: &str) -> Self {
        Self {
            url: image.url.clone(),
            alt: image
                .alt_text
                .clone()
                .unwrap_or_else(|| fallback_alt.to_string()),
            width: image.width,
            height: image.height,
        }
    }
}

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub title: String,
    pub vendor: String,
    pub description_html: String,
    pub images: Vec<ImageView>,
    pub price: String,
    pub compare_at_price: Option<String>,
}

impl ProductView {
    /// The product as shown with `selected`, its image first.
    fn new(product: &Product, selected: &ProductVariant) -> Self {
        let mut images: Vec<ImageView> = selected
            .image
            .iter()
            .map(|img| ImageView::new(img, &product.title))
            .collect();
        for image in &product.images {
            if images.iter().all(|seen| seen.url != image.url) {
                images.push(ImageView::new(image, &product.title));
            }
        }

        Self {
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            description_html: product.description_html.clone(),
            images,
            price: filters::format_money(&selected.price),
            compare_at_price: filters::format_compare_at(
                selected.compare_at_price.as_ref(),
                &selected.price,
            ),
        }
    }
}

/// Product detail page shell.
#[derive(Template)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nonce: String,
    pub page_title: String,
    pub meta_description: String,
    pub cart_count: u32,
    pub product: ProductView,
    /// Option picker built from the critical variants.
    pub picker_html: String,
}

/// Option picker and add-to-cart form.
#[derive(Template)]
#[template(path = "partials/variant_picker.html")]
pub struct VariantPickerTemplate {
    pub pickers: Vec<OptionPicker>,
    pub variant_id: String,
    pub variant_title: String,
    pub available: bool,
}

impl VariantPickerTemplate {
    fn new(
        product: &Product,
        selected: &ProductVariant,
        variants: &[ProductVariant],
        uri: &Uri,
    ) -> Self {
        Self {
            pickers: option_pickers(product, selected, variants, uri.path(), uri.query()),
            variant_id: selected.id.clone(),
            variant_title: selected.title.clone(),
            available: selected.available_for_sale,
        }
    }
}

/// Display product detail page.
#[instrument(skip(ctx, session, nonce, uri))]
pub async fn show(
    ctx: LoaderContext,
    session: Session,
    nonce: CspNonce,
    Path(handle): Path<String>,
    uri: Uri,
) -> Result<Response> {
    render(ctx, &session, nonce, handle, uri).await
}

/// Display product detail page under a `{lang}-{country}` prefix.
#[instrument(skip(ctx, session, nonce, uri))]
pub async fn show_localized(
    ctx: LoaderContext,
    session: Session,
    nonce: CspNonce,
    Path((locale, handle)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response> {
    if ctx.i18n.path_prefix.as_deref() != Some(locale.as_str()) {
        return Err(AppError::NotFound(format!("locale {locale}")));
    }
    render(ctx, &session, nonce, handle, uri).await
}

async fn render(
    ctx: LoaderContext,
    session: &Session,
    nonce: CspNonce,
    handle: String,
    uri: Uri,
) -> Result<Response> {
    let selections = selected_options_from_query(uri.query());

    let full_variants = {
        let storefront = ctx.storefront.clone();
        let locale = ctx.locale().clone();
        let handle = handle.clone();
        Deferred::spawn("product_variants", async move {
            storefront.product_variants(&locale, &handle).await
        })
    };

    let product = ctx
        .storefront
        .product(ctx.locale(), &handle, &selections)
        .await
        .map_err(AppError::from_shopify)?;

    let selected = match resolve(&product, &selections, uri.path(), uri.query())? {
        VariantSelection::Selected(variant) => variant,
        VariantSelection::Redirect(location) => {
            tracing::debug!(%location, "Redirecting to canonical variant");
            return Ok(found(&location));
        }
    };

    let path_and_query = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    ctx.analytics.publish(AnalyticsEvent::ProductViewed {
        products: vec![ProductViewPayload {
            id: product.id.clone(),
            title: product.title.clone(),
            price: selected.price.amount.clone(),
            vendor: product.vendor.clone(),
            variant_id: selected.id.clone(),
            variant_title: selected.title.clone(),
            quantity: 1,
        }],
        shop: ctx.shop(Some(&selected.price.currency_code)),
        url: ctx.absolute_url(&path_and_query),
    });

    let shell = ProductShowTemplate {
        nonce: nonce.value().to_string(),
        page_title: format!("Beyond Wellness | {}", product.title),
        meta_description: product
            .seo
            .description
            .clone()
            .unwrap_or_else(|| product.description.clone()),
        cart_count: badge_count(session).await,
        product: ProductView::new(&product, &selected),
        picker_html: VariantPickerTemplate::new(&product, &selected, &product.variants, &uri)
            .render()?,
    };

    let page = StreamedPage::new(&shell, nonce)?.section(
        OPTIONS_SECTION,
        full_variants,
        move |variants: Option<Vec<ProductVariant>>| {
            let selected = reconcile_selected_variant(&selected, variants.as_deref());
            let known = variants.as_deref().unwrap_or(&product.variants);
            render_section(&VariantPickerTemplate::new(&product, &selected, known, &uri))
        },
    );
    Ok(page.into_response())
}

/// A 302 to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::{Money, PriceRange, ProductOption, SelectedOption, Seo};

    fn money(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn image(url: &str) -> Image {
        Image {
            id: None,
            url: url.to_string(),
            alt_text: None,
            width: None,
            height: None,
        }
    }

    fn variant(id: &str, color: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: id.to_string(),
            title: color.to_string(),
            available_for_sale: available,
            sku: None,
            price: money("10.0"),
            compare_at_price: Some(money("12.0")),
            selected_options: vec![SelectedOption::new("Color", color)],
            image: Some(image("https://cdn.shopify.com/blue.jpg")),
        }
    }

    fn widget() -> Product {
        Product {
            id: "gid://shopify/Product/1".to_string(),
            handle: "widget".to_string(),
            title: "Widget".to_string(),
            vendor: "Beyond Wellness".to_string(),
            description: String::new(),
            description_html: "<p>Hi</p>".to_string(),
            seo: Seo::default(),
            price_range: PriceRange {
                min_variant_price: money("10.0"),
                max_variant_price: money("10.0"),
            },
            images: vec![
                image("https://cdn.shopify.com/red.jpg"),
                image("https://cdn.shopify.com/blue.jpg"),
            ],
            options: vec![ProductOption {
                name: "Color".to_string(),
                values: vec!["Red".to_string(), "Blue".to_string()],
            }],
            variants: vec![variant("V1", "Red", true), variant("V2", "Blue", false)],
            selected_variant: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_product_view_puts_variant_image_first() {
        let product = widget();
        let view = ProductView::new(&product, &variant("V2", "Blue", true));
        let urls: Vec<&str> = view.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            ["https://cdn.shopify.com/blue.jpg", "https://cdn.shopify.com/red.jpg"]
        );
        assert_eq!(view.price, "$10.00");
        assert_eq!(view.compare_at_price.as_deref(), Some("$12.00"));
    }

    #[test]
    fn test_picker_renders_links() {
        let product = widget();
        let uri: Uri = "/products/widget?Color=Red".parse().unwrap_or_default();
        let selected = &product.variants[0];
        let html = VariantPickerTemplate::new(&product, selected, &product.variants, &uri)
            .render()
            .unwrap_or_default();
        assert!(html.contains("/products/widget?Color=Blue"));
        assert!(html.contains("value=\"V1\""));
    }

    #[test]
    fn test_found_sets_location() {
        let response = found("/products/widget?Color=Red");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/products/widget?Color=Red"
        );
    }
}
