//! Per-request loader context.
//!
//! Loaders and handlers receive the storefront client, the analytics
//! emitter and the request locale through [`LoaderContext`] instead of
//! reaching for shared globals.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use beyond_wellness_core::CurrencyCode;

use crate::analytics::{Analytics, ShopContext};
use crate::shopify::{Locale, StorefrontClient};
use crate::state::AppState;
use crate::variants::locale_prefix;

/// Locale of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18n {
    /// `@inContext` country and language.
    pub locale: Locale,
    /// `{lang}-{country}` path segment the request came in under, if any.
    pub path_prefix: Option<String>,
}

impl I18n {
    /// Locale for `pathname`: from its `{lang}-{country}` segment, else `default`.
    #[must_use]
    pub fn from_path(pathname: &str, default: &Locale) -> Self {
        locale_prefix(pathname).map_or_else(
            || Self {
                locale: default.clone(),
                path_prefix: None,
            },
            |prefix| {
                let (language, country) = prefix.split_once('-').unwrap_or((prefix, ""));
                Self {
                    locale: Locale::new(country, language),
                    path_prefix: Some(prefix.to_string()),
                }
            },
        )
    }

    /// Prefix `path` with this request's locale segment.
    #[must_use]
    pub fn localize(&self, path: &str) -> String {
        self.path_prefix
            .as_ref()
            .map_or_else(|| path.to_string(), |prefix| format!("/{prefix}{path}"))
    }
}

/// Everything a loader needs, resolved once per request.
#[derive(Clone)]
pub struct LoaderContext {
    pub storefront: StorefrontClient,
    pub analytics: Analytics,
    pub i18n: I18n,
    shop_id: Option<String>,
    base_url: String,
}

impl LoaderContext {
    #[must_use]
    pub fn new(state: &AppState, pathname: &str) -> Self {
        Self {
            storefront: state.storefront().clone(),
            analytics: state.analytics().clone(),
            i18n: I18n::from_path(pathname, &state.default_locale()),
            shop_id: state.config().shopify.shop_id.clone(),
            base_url: state.config().base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Shorthand for the `@inContext` locale.
    #[must_use]
    pub const fn locale(&self) -> &Locale {
        &self.i18n.locale
    }

    /// Shop context for analytics events priced in `currency`.
    #[must_use]
    pub fn shop(&self, currency: Option<&str>) -> ShopContext {
        ShopContext {
            shop_id: self.shop_id.clone(),
            accepted_language: self.i18n.locale.language.clone(),
            currency: currency.map_or_else(
                || CurrencyCode::default().code().to_string(),
                ToString::to_string,
            ),
        }
    }

    /// Absolute URL of `path_and_query` on this storefront.
    #[must_use]
    pub fn absolute_url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }
}

impl FromRequestParts<AppState> for LoaderContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::new(state, parts.uri.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i18n_from_prefixed_path() {
        let i18n = I18n::from_path("/fr-ca/products/widget", &Locale::new("US", "EN"));
        assert_eq!(i18n.locale, Locale::new("CA", "FR"));
        assert_eq!(i18n.path_prefix.as_deref(), Some("fr-ca"));
        assert_eq!(i18n.localize("/cart"), "/fr-ca/cart");
    }

    #[test]
    fn test_i18n_defaults_without_prefix() {
        let i18n = I18n::from_path("/products/widget", &Locale::new("US", "EN"));
        assert_eq!(i18n.locale, Locale::new("US", "EN"));
        assert_eq!(i18n.path_prefix, None);
        assert_eq!(i18n.localize("/cart"), "/cart");
    }
}
