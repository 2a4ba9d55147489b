//! Beyond Wellness Core - Shared domain types.
//!
//! This crate provides the types the storefront reasons about without
//! talking to Shopify:
//! - newsletter email validation
//! - price parsing and display
//! - cart snapshots and the optimistic cart projection
//!
//! # Architecture
//!
//! The core crate contains only types and pure state machines - no I/O, no
//! HTTP clients. Shopify remains the single writer for carts; this crate only
//! describes what the storefront expects a pending mutation to do.
//!
//! # Modules
//!
//! - [`types`] - Email and price newtypes
//! - [`cart`] - Cart snapshots, mutation deltas, and [`cart::OptimisticCart`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    CartDelta, CartLineSnapshot, CartSnapshot, OptimisticCart, OptimisticError, OptimisticPhase,
};
pub use types::*;
