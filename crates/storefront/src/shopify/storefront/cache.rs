//! Cache types for Storefront API responses.
//!
//! Only catalog reads are cached. Keys carry the `@inContext` locale because
//! prices and translations differ per market.

use crate::shopify::types::{
    Collection, Locale, Product, ProductConnection, ProductSummary, ProductVariant,
    SelectedOption,
};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    FeaturedCollection(Locale),
    RecommendedProducts(Locale),
    AllProducts {
        locale: Locale,
        first: i64,
        cursor: Option<String>,
    },
    Product {
        locale: Locale,
        handle: String,
        selected_options: Vec<(String, String)>,
    },
    ProductVariants {
        locale: Locale,
        handle: String,
    },
}

impl CacheKey {
    pub fn product(locale: &Locale, handle: &str, selected_options: &[SelectedOption]) -> Self {
        Self::Product {
            locale: locale.clone(),
            handle: handle.to_string(),
            selected_options: selected_options
                .iter()
                .map(|o| (o.name.clone(), o.value.clone()))
                .collect(),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    FeaturedCollection(Option<Collection>),
    Products(ProductConnection),
    Recommended(Vec<ProductSummary>),
    Product(Box<Product>),
    Variants(Vec<ProductVariant>),
}
