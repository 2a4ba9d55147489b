//! Product type conversion functions.

use crate::shopify::types::{
    PageInfo, PriceRange, Product, ProductConnection, ProductOption, ProductSummary,
    ProductVariant, Seo,
};

use super::super::queries::{
    ProductCardFields, ProductVariantFields, all_products, product_by_handle,
};

pub fn convert_variant(v: ProductVariantFields) -> ProductVariant {
    ProductVariant {
        id: v.id,
        title: v.title,
        available_for_sale: v.available_for_sale,
        sku: v.sku,
        price: v.price.into(),
        compare_at_price: v.compare_at_price.map(Into::into),
        selected_options: v.selected_options.into_iter().map(Into::into).collect(),
        image: v.image.map(Into::into),
    }
}

pub fn convert_product(p: product_by_handle::ProductFields) -> Product {
    Product {
        id: p.id,
        handle: p.handle,
        title: p.title,
        vendor: p.vendor,
        description: p.description,
        description_html: p.description_html,
        seo: Seo {
            title: p.seo.title,
            description: p.seo.description,
        },
        price_range: PriceRange {
            min_variant_price: p.price_range.min_variant_price.into(),
            max_variant_price: p.price_range.max_variant_price.into(),
        },
        images: p.images.nodes.into_iter().map(Into::into).collect(),
        options: p
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.option_values.into_iter().map(|v| v.name).collect(),
            })
            .collect(),
        variants: p.variants.nodes.into_iter().map(convert_variant).collect(),
        selected_variant: p.selected_variant.map(convert_variant),
        tags: p.tags,
    }
}

pub fn convert_product_summary(p: ProductCardFields) -> ProductSummary {
    ProductSummary {
        id: p.id,
        handle: p.handle,
        title: p.title,
        min_price: p.price_range.min_variant_price.into(),
        featured_image: p.featured_image.map(Into::into),
    }
}

pub fn convert_product_connection(page: all_products::ProductsPage) -> ProductConnection {
    ProductConnection {
        products: page.nodes.into_iter().map(convert_product_summary).collect(),
        page_info: PageInfo {
            has_next_page: page.page_info.has_next_page,
            end_cursor: page.page_info.end_cursor,
        },
    }
}
