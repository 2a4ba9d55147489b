//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;
pub mod collections;
pub mod products;

pub use cart::{convert_cart, convert_user_errors};
pub use collections::convert_collection;
pub use products::{
    convert_product, convert_product_connection, convert_product_summary, convert_variant,
};

use crate::shopify::types::{Image, Money, SelectedOption};

use super::queries::{ImageFields, MoneyFields, SelectedOptionFields};

impl From<MoneyFields> for Money {
    fn from(m: MoneyFields) -> Self {
        Self {
            amount: m.amount,
            currency_code: m.currency_code,
        }
    }
}

impl From<ImageFields> for Image {
    fn from(i: ImageFields) -> Self {
        Self {
            id: i.id,
            url: i.url,
            alt_text: i.alt_text,
            width: i.width,
            height: i.height,
        }
    }
}

impl From<SelectedOptionFields> for SelectedOption {
    fn from(o: SelectedOptionFields) -> Self {
        Self {
            name: o.name,
            value: o.value,
        }
    }
}
