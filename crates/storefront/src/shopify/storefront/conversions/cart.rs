//! Cart type conversion functions.

use crate::shopify::types::{
    Cart, CartCost, CartLine, CartLineCost, CartMerchandise, CartMerchandiseProduct, UserError,
};

use super::super::queries::{CartFields, CartLineFields, UserErrorFields};

pub fn convert_cart(cart: CartFields) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
        cost: CartCost {
            subtotal: cart.cost.subtotal_amount.into(),
            total: cart.cost.total_amount.into(),
        },
        lines: cart.lines.nodes.into_iter().map(convert_cart_line).collect(),
    }
}

fn convert_cart_line(line: CartLineFields) -> CartLine {
    let merchandise = line.merchandise;
    CartLine {
        id: line.id,
        quantity: line.quantity,
        cost: CartLineCost {
            amount_per_quantity: line.cost.amount_per_quantity.into(),
            total_amount: line.cost.total_amount.into(),
        },
        merchandise: CartMerchandise {
            id: merchandise.id,
            title: merchandise.title,
            selected_options: merchandise
                .selected_options
                .into_iter()
                .map(Into::into)
                .collect(),
            image: merchandise.image.map(Into::into),
            product: CartMerchandiseProduct {
                handle: merchandise.product.handle,
                title: merchandise.product.title,
            },
        },
    }
}

pub fn convert_user_errors(errors: Vec<UserErrorFields>) -> Vec<UserError> {
    errors
        .into_iter()
        .map(|e| UserError {
            code: e.code,
            field: e.field,
            message: e.message,
        })
        .collect()
}
