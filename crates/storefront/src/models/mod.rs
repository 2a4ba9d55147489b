//! Types stored outside Shopify.

pub mod session;
