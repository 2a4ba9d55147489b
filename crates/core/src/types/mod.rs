//! Core value types for the storefront.

pub mod email;
pub mod price;

pub use email::{Email, EmailError};
pub use price::{CurrencyCode, Price, PriceError};
