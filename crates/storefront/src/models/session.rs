//! Session-related types.
//!
//! The session holds only what the storefront needs to find the visitor's
//! cart again; Shopify owns everything else.

/// Session keys for cart state.
pub mod keys {
    /// Key for storing the Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the last cart snapshot Shopify confirmed.
    ///
    /// Seeds the optimistic projection of the next cart mutation.
    pub const CART_SNAPSHOT: &str = "cart_snapshot";

    /// Key for the cart snapshot shown the last time the cart panel opened.
    ///
    /// Becomes `prevCart` on the next `cart_viewed` event.
    pub const LAST_VIEWED_CART: &str = "last_viewed_cart";
}
