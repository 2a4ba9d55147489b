//! Shopify Storefront API client implementation.
//!
//! Sends the static documents in [`queries`] with `reqwest` 0.13 and
//! translates GraphQL errors into [`ShopifyError`]. Catalog reads are cached
//! with `moka` for the configured TTL; cart and customer mutations never are.

mod cache;
mod conversions;

pub mod queries;

use std::sync::Arc;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, Customer, Locale, Product,
    ProductConnection, ProductSummary, ProductVariant, SelectedOption, UserError,
};

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_cart, convert_collection, convert_product, convert_product_connection,
    convert_product_summary, convert_user_errors, convert_variant,
};
use queries::{
    AddToCart, AllProducts, CartMutationPayload, CreateCart, CustomerCreate, FeaturedCollection,
    GetCart, InContext, ProductByHandle, ProductVariants, RecommendedProducts, RemoveFromCart,
    UpdateCartLines, add_to_cart, all_products, create_cart, customer_create,
    featured_collection, get_cart, product_by_handle, product_variants, recommended_products,
    remove_from_cart, update_cart_lines,
};

/// Variants fetched with the product on the critical path.
///
/// The full list (up to 250) is loaded separately by [`StorefrontClient::product_variants`].
pub const CRITICAL_VARIANT_COUNT: i64 = 25;

impl From<&Locale> for InContext {
    fn from(locale: &Locale) -> Self {
        Self {
            country: locale.country.clone(),
            language: locale.language.clone(),
        }
    }
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; all clones share one HTTP client and one cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint(),
                access_token: config.storefront_private_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Server-side requests authenticate with the private token header,
            // not the public X-Shopify-Storefront-Access-Token.
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read as text first so parse failures can log the body
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: truncate(&response_text, 200),
            });
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(super::GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![super::GraphQLError::message("No data in response")])
        })
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let hit = self.inner.cache.get(key).await;
        if hit.is_some() {
            debug!(key = ?key, "Cache hit");
        }
        hit
    }

    // =========================================================================
    // Home page
    // =========================================================================

    /// The most recently updated collection, if the store has any.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_collection(
        &self,
        locale: &Locale,
    ) -> Result<Option<Collection>, ShopifyError> {
        let key = CacheKey::FeaturedCollection(locale.clone());
        if let Some(CacheValue::FeaturedCollection(collection)) = self.cached(&key).await {
            return Ok(collection);
        }

        let data = self
            .execute::<FeaturedCollection>(featured_collection::Variables {
                context: locale.into(),
            })
            .await?;

        let collection = data.collections.nodes.into_iter().next().map(convert_collection);
        self.inner
            .cache
            .insert(key, CacheValue::FeaturedCollection(collection.clone()))
            .await;
        Ok(collection)
    }

    /// A page of the catalog sorted by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn all_products(
        &self,
        locale: &Locale,
        first: i64,
        after: Option<String>,
    ) -> Result<ProductConnection, ShopifyError> {
        let key = CacheKey::AllProducts {
            locale: locale.clone(),
            first,
            cursor: after.clone(),
        };
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let data = self
            .execute::<AllProducts>(all_products::Variables {
                context: locale.into(),
                first,
                after,
            })
            .await?;

        let connection = convert_product_connection(data.products);
        self.inner
            .cache
            .insert(key, CacheValue::Products(connection.clone()))
            .await;
        Ok(connection)
    }

    /// The four most recently updated products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn recommended_products(
        &self,
        locale: &Locale,
    ) -> Result<Vec<ProductSummary>, ShopifyError> {
        let key = CacheKey::RecommendedProducts(locale.clone());
        if let Some(CacheValue::Recommended(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let data = self
            .execute::<RecommendedProducts>(recommended_products::Variables {
                context: locale.into(),
            })
            .await?;

        let products: Vec<_> = data
            .products
            .nodes
            .into_iter()
            .map(convert_product_summary)
            .collect();
        self.inner
            .cache
            .insert(key, CacheValue::Recommended(products.clone()))
            .await;
        Ok(products)
    }

    // =========================================================================
    // Product page
    // =========================================================================

    /// A product by handle, with Shopify's match for `selected_options`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if no product has this handle, or an
    /// error if the API request fails.
    #[instrument(skip(self, selected_options), fields(handle = %handle))]
    pub async fn product(
        &self,
        locale: &Locale,
        handle: &str,
        selected_options: &[SelectedOption],
    ) -> Result<Product, ShopifyError> {
        let key = CacheKey::product(locale, handle, selected_options);
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            return Ok(*product);
        }

        let data = self
            .execute::<ProductByHandle>(product_by_handle::Variables {
                context: locale.into(),
                handle: handle.to_string(),
                selected_options: selected_options
                    .iter()
                    .map(|o| product_by_handle::SelectedOptionInput {
                        name: o.name.clone(),
                        value: o.value.clone(),
                    })
                    .collect(),
                variant_count: CRITICAL_VARIANT_COUNT,
            })
            .await?;

        let product = data
            .product
            .map(convert_product)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Every variant of a product.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if no product has this handle, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn product_variants(
        &self,
        locale: &Locale,
        handle: &str,
    ) -> Result<Vec<ProductVariant>, ShopifyError> {
        let key = CacheKey::ProductVariants {
            locale: locale.clone(),
            handle: handle.to_string(),
        };
        if let Some(CacheValue::Variants(variants)) = self.cached(&key).await {
            return Ok(variants);
        }

        let data = self
            .execute::<ProductVariants>(product_variants::Variables {
                context: locale.into(),
                handle: handle.to_string(),
            })
            .await?;

        let variants: Vec<_> = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?
            .variants
            .nodes
            .into_iter()
            .map(convert_variant)
            .collect();

        self.inner
            .cache
            .insert(key, CacheValue::Variants(variants.clone()))
            .await;
        Ok(variants)
    }

    // =========================================================================
    // Cart (not cached - mutable state)
    // =========================================================================

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if the cart expired or never existed,
    /// or an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, locale: &Locale, cart_id: &str) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<GetCart>(get_cart::Variables {
                context: locale.into(),
                cart_id: cart_id.to_string(),
            })
            .await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Create a cart holding `lines`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines))]
    pub async fn create_cart(
        &self,
        locale: &Locale,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(create_cart::Variables {
                context: locale.into(),
                input: create_cart::CartInput { lines },
            })
            .await?;

        cart_from_payload(data.cart_create, "create cart")
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        locale: &Locale,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<AddToCart>(add_to_cart::Variables {
                context: locale.into(),
                cart_id: cart_id.to_string(),
                lines,
            })
            .await?;

        cart_from_payload(data.cart_lines_add, "add to cart")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        locale: &Locale,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartLines>(update_cart_lines::Variables {
                context: locale.into(),
                cart_id: cart_id.to_string(),
                lines,
            })
            .await?;

        cart_from_payload(data.cart_lines_update, "update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        locale: &Locale,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<RemoveFromCart>(remove_from_cart::Variables {
                context: locale.into(),
                cart_id: cart_id.to_string(),
                line_ids,
            })
            .await?;

        cart_from_payload(data.cart_lines_remove, "remove from cart")
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Create a customer, used for newsletter sign-ups.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::UserError`] carrying Shopify's messages (e.g.
    /// "Email has already been taken"), or an error if the API request fails.
    #[instrument(skip(self, email, password))]
    pub async fn create_customer(
        &self,
        email: &str,
        password: &str,
        accepts_marketing: bool,
    ) -> Result<Customer, ShopifyError> {
        let data = self
            .execute::<CustomerCreate>(customer_create::Variables {
                input: customer_create::CustomerCreateInput {
                    email: email.to_string(),
                    password: password.to_string(),
                    accepts_marketing,
                },
            })
            .await?;

        let payload = data.customer_create.ok_or_else(|| {
            ShopifyError::GraphQL(vec![super::GraphQLError::message(
                "Failed to create customer",
            )])
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(user_error(convert_user_errors(
                payload.customer_user_errors,
            )));
        }

        payload
            .customer
            .map(|c| Customer {
                id: c.id,
                email: c.email,
            })
            .ok_or_else(|| {
                ShopifyError::GraphQL(vec![super::GraphQLError::message(
                    "Failed to create customer",
                )])
            })
    }
}

/// Unwrap a `cart*` mutation payload, surfacing user errors.
fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    action: &str,
) -> Result<Cart, ShopifyError> {
    if let Some(result) = payload {
        if !result.user_errors.is_empty() {
            return Err(user_error(convert_user_errors(result.user_errors)));
        }
        if let Some(cart) = result.cart {
            return Ok(convert_cart(cart));
        }
    }

    Err(ShopifyError::GraphQL(vec![super::GraphQLError::message(
        format!("Failed to {action}"),
    )]))
}

fn user_error(errors: Vec<UserError>) -> ShopifyError {
    ShopifyError::UserError(
        errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
