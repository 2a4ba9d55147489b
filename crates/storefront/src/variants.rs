//! Product variant selection from URL query parameters.
//!
//! A product URL carries its option selections in the query string
//! (`/products/widget?Color=Blue&Size=M`). Every request either resolves to
//! exactly one variant or is redirected to the canonical URL of the product's
//! first variant, so a page never renders an ambiguous selection.

use url::form_urlencoded;

use crate::shopify::{Product, ProductVariant, SelectedOption};

/// Option name and value Shopify uses for single-variant products.
const DEFAULT_OPTION_NAME: &str = "Title";
const DEFAULT_OPTION_VALUE: &str = "Default Title";

/// Outcome of resolving a product page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantSelection {
    /// Render the page with this variant.
    Selected(ProductVariant),
    /// Redirect (302) to this URL.
    Redirect(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A product with no variants cannot be rendered or bought.
    #[error("product {0} has no variants")]
    NoVariants(String),
}

/// Parse every query parameter as an option selection, in order.
///
/// Unknown names are kept; matching ignores them.
#[must_use]
pub fn selected_options_from_query(query: Option<&str>) -> Vec<SelectedOption> {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .map(|(name, value)| SelectedOption::new(name, value))
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `variant` is Shopify's synthetic variant for products without options.
#[must_use]
pub fn is_default_variant(variant: &ProductVariant) -> bool {
    is_default_selection(&variant.selected_options)
}

/// Whether `options` are those of the synthetic default variant.
#[must_use]
pub fn is_default_selection(options: &[SelectedOption]) -> bool {
    options
        .iter()
        .any(|o| o.name == DEFAULT_OPTION_NAME && o.value == DEFAULT_OPTION_VALUE)
}

/// Whether `selections` pick a value for every option of `variant`, and
/// each picked value is the variant's.
///
/// Names and values compare case-insensitively. Selections for names the
/// variant does not have are ignored. When a name repeats, its first
/// occurrence counts.
fn matches(variant: &ProductVariant, selections: &[SelectedOption]) -> bool {
    variant.selected_options.iter().all(|option| {
        selections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(&option.name))
            .is_some_and(|s| s.value.to_lowercase() == option.value.to_lowercase())
    })
}

/// The single variant in `variants` that `selections` identify, if exactly one does.
#[must_use]
pub fn find_variant<'a>(
    variants: &'a [ProductVariant],
    selections: &[SelectedOption],
) -> Option<&'a ProductVariant> {
    let mut found = variants.iter().filter(|v| matches(v, selections));
    let first = found.next()?;
    found.next().is_none().then_some(first)
}

/// Decide which variant a product page request shows.
///
/// `pathname` and `query` are the request's, used to build the redirect.
///
/// # Errors
///
/// Returns [`ResolveError::NoVariants`] for a product without variants.
pub fn resolve(
    product: &Product,
    selections: &[SelectedOption],
    pathname: &str,
    query: Option<&str>,
) -> Result<VariantSelection, ResolveError> {
    let first = product
        .variants
        .first()
        .ok_or_else(|| ResolveError::NoVariants(product.handle.clone()))?;

    if is_default_variant(first) {
        return Ok(VariantSelection::Selected(first.clone()));
    }

    if let Some(variant) = find_variant(&product.variants, selections) {
        return Ok(VariantSelection::Selected(variant.clone()));
    }

    if !selections.is_empty()
        && let Some(variant) = &product.selected_variant
    {
        return Ok(VariantSelection::Selected(variant.clone()));
    }

    Ok(VariantSelection::Redirect(variant_url(
        pathname,
        &product.handle,
        &first.selected_options,
        query,
    )))
}

/// The `{lang}-{country}` path segment, if `pathname` has one followed by
/// another segment (e.g. `en-us` in `/en-us/products/widget`).
#[must_use]
pub fn locale_prefix(pathname: &str) -> Option<&str> {
    let segments: Vec<&str> = pathname.split('/').collect();
    // Skip the empty segment before the leading slash and require a trailing one.
    segments
        .iter()
        .take(segments.len().saturating_sub(1))
        .skip(1)
        .copied()
        .find(|segment| is_locale_segment(segment))
}

fn is_locale_segment(segment: &str) -> bool {
    matches!(
        segment.as_bytes(),
        [a, b, b'-', c, d] if [a, b, c, d].iter().all(|byte| byte.is_ascii_alphabetic())
    )
}

/// Canonical URL of a variant.
///
/// Keeps the locale prefix of `pathname` and every parameter of
/// `existing_query`. Each option replaces the first parameter with its name
/// in place (dropping later duplicates) or is appended.
#[must_use]
pub fn variant_url(
    pathname: &str,
    handle: &str,
    options: &[SelectedOption],
    existing_query: Option<&str>,
) -> String {
    let path = locale_prefix(pathname).map_or_else(
        || format!("/products/{handle}"),
        |prefix| format!("/{prefix}/products/{handle}"),
    );

    let mut params: Vec<(String, String)> = existing_query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    for option in options {
        set_param(&mut params, &option.name, &option.value);
    }

    if params.is_empty() {
        return path;
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    format!("{path}?{query}")
}

fn set_param(params: &mut Vec<(String, String)>, name: &str, value: &str) {
    let Some(position) = params
        .iter()
        .position(|(key, _)| key.eq_ignore_ascii_case(name))
    else {
        params.push((name.to_string(), value.to_string()));
        return;
    };

    // Matching is case-insensitive, so the option's own spelling replaces it
    if let Some(existing) = params.get_mut(position) {
        *existing = (name.to_string(), value.to_string());
    }
    let mut index = 0;
    params.retain(|(key, _)| {
        let keep = index <= position || !key.eq_ignore_ascii_case(name);
        index += 1;
        keep
    });
}

/// Refresh the critical-path selection from the full variant list.
///
/// The full list is loaded later and carries current availability and
/// price. Without it, or if it no longer contains the variant, the
/// critical selection stands.
#[must_use]
pub fn reconcile_selected_variant(
    selected: &ProductVariant,
    full_list: Option<&[ProductVariant]>,
) -> ProductVariant {
    full_list
        .and_then(|variants| variants.iter().find(|v| v.id == selected.id))
        .unwrap_or(selected)
        .clone()
}

// =============================================================================
// Option picker
// =============================================================================

/// One value in the option picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValueLink {
    pub value: String,
    /// Canonical URL selecting this value with the other options unchanged.
    pub url: String,
    pub selected: bool,
    /// Whether a purchasable variant exists for this combination.
    pub available: bool,
}

/// One product option with its value links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionPicker {
    pub name: String,
    pub values: Vec<OptionValueLink>,
}

/// Build the option picker for `product` around the `selected` variant.
///
/// `variants` is the best known variant list (the full list once loaded).
/// Products with only the default variant get no picker.
#[must_use]
pub fn option_pickers(
    product: &Product,
    selected: &ProductVariant,
    variants: &[ProductVariant],
    pathname: &str,
    query: Option<&str>,
) -> Vec<OptionPicker> {
    if is_default_variant(selected) {
        return Vec::new();
    }

    product
        .options
        .iter()
        .map(|option| OptionPicker {
            name: option.name.clone(),
            values: option
                .values
                .iter()
                .map(|value| {
                    let target: Vec<SelectedOption> = selected
                        .selected_options
                        .iter()
                        .map(|o| {
                            if o.name == option.name {
                                SelectedOption::new(&o.name, value)
                            } else {
                                o.clone()
                            }
                        })
                        .collect();
                    let variant = find_variant(variants, &target);
                    OptionValueLink {
                        value: value.clone(),
                        url: variant_url(pathname, &product.handle, &target, query),
                        selected: selected
                            .selected_options
                            .iter()
                            .any(|o| o.name == option.name && &o.value == value),
                        available: variant.is_some_and(|v| v.available_for_sale),
                    }
                })
                .collect(),
        })
        .collect()
}
