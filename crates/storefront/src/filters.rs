//! Custom Askama template filters and price formatting.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use beyond_wellness_core::Price;

use crate::shopify::Money;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Format a Shopify money value for display (e.g., "$19.50").
///
/// Currencies the storefront does not sell in fall back to `"<amount> <code>"`.
#[must_use]
pub fn format_money(money: &Money) -> String {
    Price::parse(&money.amount, &money.currency_code).map_or_else(
        |_| format!("{} {}", money.amount, money.currency_code),
        |price| price.display(),
    )
}

/// Format a compare-at price, hiding it unless it is above `price`.
#[must_use]
pub fn format_compare_at(compare_at: Option<&Money>, price: &Money) -> Option<String> {
    let compare_at = compare_at?;
    let was = Price::parse(&compare_at.amount, &compare_at.currency_code).ok()?;
    let now = Price::parse(&price.amount, &price.currency_code).ok()?;
    (!was.is_zero() && was.amount > now.amount).then(|| was.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(amount: &str, code: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: code.to_string(),
        }
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(&money("19.5", "USD")), "$19.50");
        assert_eq!(format_money(&money("100.0", "JPY")), "100.0 JPY");
    }

    #[test]
    fn test_format_compare_at() {
        let price = money("10.0", "USD");
        assert_eq!(
            format_compare_at(Some(&money("12.0", "USD")), &price),
            Some("$12.00".to_string())
        );
        assert_eq!(format_compare_at(Some(&money("0.0", "USD")), &price), None);
        assert_eq!(format_compare_at(Some(&money("10.0", "USD")), &price), None);
        assert_eq!(format_compare_at(None, &price), None);
    }
}
