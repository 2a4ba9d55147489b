//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation is a static document paired with its variables and
//! response shapes. The `storefront_operation!` macro implements
//! [`GraphQLQuery`] for the operation marker type, so the client can stay
//! generic over `Q: GraphQLQuery` exactly as it would with derived queries.
//!
//! Every catalog document carries `@inContext(country:, language:)` so
//! prices and translations follow the request locale.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

// =============================================================================
// Fragments
// =============================================================================

macro_rules! money_fragment {
    () => {
        "fragment MoneyFields on MoneyV2 { amount currencyCode }\n"
    };
}

macro_rules! image_fragment {
    () => {
        "fragment ImageFields on Image { id url altText width height }\n"
    };
}

macro_rules! variant_fragment {
    () => {
        r"fragment ProductVariantFields on ProductVariant {
  id
  title
  availableForSale
  sku
  price { ...MoneyFields }
  compareAtPrice { ...MoneyFields }
  selectedOptions { name value }
  image { ...ImageFields }
}
"
    };
}

macro_rules! product_card_fragment {
    () => {
        r"fragment ProductCardFields on Product {
  id
  title
  handle
  priceRange { minVariantPrice { ...MoneyFields } }
  featuredImage { ...ImageFields }
}
"
    };
}

macro_rules! cart_fragment {
    () => {
        r"fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount { ...MoneyFields }
    totalAmount { ...MoneyFields }
  }
  lines(first: 100) {
    nodes {
      id
      quantity
      cost {
        amountPerQuantity { ...MoneyFields }
        totalAmount { ...MoneyFields }
      }
      merchandise {
        ... on ProductVariant {
          id
          title
          selectedOptions { name value }
          image { ...ImageFields }
          product { handle title }
        }
      }
    }
  }
}
"
    };
}

/// Implements [`GraphQLQuery`] for a marker type over a static document.
///
/// The marker's name must match the operation name inside the document.
macro_rules! storefront_operation {
    ($(#[$meta:meta])* $name:ident, $module:ident, $document:expr) => {
        $(#[$meta])*
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// `{ nodes: [...] }` connection wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFields {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub id: Option<String>,
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionFields {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantFields {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub sku: Option<String>,
    pub price: MoneyFields,
    pub compare_at_price: Option<MoneyFields>,
    pub selected_options: Vec<SelectedOptionFields>,
    pub image: Option<ImageFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinPriceRange {
    pub min_variant_price: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCardFields {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub price_range: MinPriceRange,
    pub featured_image: Option<ImageFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub subtotal_amount: MoneyFields,
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostFields {
    pub amount_per_quantity: MoneyFields,
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseProductFields {
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseFields {
    pub id: String,
    pub title: String,
    pub selected_options: Vec<SelectedOptionFields>,
    pub image: Option<ImageFields>,
    pub product: MerchandiseProductFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineFields {
    pub id: String,
    pub quantity: i64,
    pub cost: CartLineCostFields,
    pub merchandise: MerchandiseFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCostFields,
    pub lines: Nodes<CartLineFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorFields {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every `cart*` mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    pub user_errors: Vec<UserErrorFields>,
}

/// Locale variables for `@inContext`.
#[derive(Debug, Clone, Serialize)]
pub struct InContext {
    pub country: String,
    pub language: String,
}

// =============================================================================
// Home page
// =============================================================================

pub mod featured_collection {
    use super::{ImageFields, InContext, Nodes};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: Nodes<CollectionFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CollectionFields {
        pub id: String,
        pub title: String,
        pub handle: String,
        pub image: Option<ImageFields>,
    }
}

storefront_operation!(
    /// The most recently updated collection, shown as the home banner.
    FeaturedCollection,
    featured_collection,
    concat!(
        r"query FeaturedCollection($country: CountryCode, $language: LanguageCode)
  @inContext(country: $country, language: $language) {
  collections(first: 1, sortKey: UPDATED_AT, reverse: true) {
    nodes { id title handle image { ...ImageFields } }
  }
}
",
        image_fragment!()
    )
);

pub mod recommended_products {
    use super::{InContext, Nodes, ProductCardFields};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Nodes<ProductCardFields>,
    }
}

storefront_operation!(
    /// The four most recently updated products.
    RecommendedProducts,
    recommended_products,
    concat!(
        r"query RecommendedProducts($country: CountryCode, $language: LanguageCode)
  @inContext(country: $country, language: $language) {
  products(first: 4, sortKey: UPDATED_AT, reverse: true) {
    nodes { ...ProductCardFields }
  }
}
",
        product_card_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

pub mod all_products {
    use super::{InContext, ProductCardFields};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub first: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: ProductsPage,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductsPage {
        pub nodes: Vec<ProductCardFields>,
        pub page_info: PageInfoFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInfoFields {
        pub has_next_page: bool,
        pub end_cursor: Option<String>,
    }
}

storefront_operation!(
    /// A page of the catalog sorted by title.
    AllProducts,
    all_products,
    concat!(
        r"query AllProducts($country: CountryCode, $language: LanguageCode, $first: Int!, $after: String)
  @inContext(country: $country, language: $language) {
  products(first: $first, after: $after, sortKey: TITLE) {
    nodes { ...ProductCardFields }
    pageInfo { hasNextPage endCursor }
  }
}
",
        product_card_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

// =============================================================================
// Product page
// =============================================================================

pub mod product_by_handle {
    use super::{ImageFields, InContext, MoneyFields, Nodes, ProductVariantFields};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub handle: String,
        pub selected_options: Vec<SelectedOptionInput>,
        pub variant_count: i64,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct SelectedOptionInput {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductFields {
        pub id: String,
        pub title: String,
        pub vendor: String,
        pub handle: String,
        pub description: String,
        pub description_html: String,
        pub tags: Vec<String>,
        pub seo: SeoFields,
        pub price_range: PriceRangeFields,
        pub options: Vec<OptionFields>,
        pub images: Nodes<ImageFields>,
        pub selected_variant: Option<ProductVariantFields>,
        pub variants: Nodes<ProductVariantFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SeoFields {
        pub title: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRangeFields {
        pub min_variant_price: MoneyFields,
        pub max_variant_price: MoneyFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OptionFields {
        pub name: String,
        pub option_values: Vec<OptionValueFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OptionValueFields {
        pub name: String,
    }
}

storefront_operation!(
    /// A product with the variant Shopify matches for the requested options.
    ProductByHandle,
    product_by_handle,
    concat!(
        r"query ProductByHandle(
  $country: CountryCode
  $language: LanguageCode
  $handle: String!
  $selectedOptions: [SelectedOptionInput!]!
  $variantCount: Int!
) @inContext(country: $country, language: $language) {
  product(handle: $handle) {
    id
    title
    vendor
    handle
    description
    descriptionHtml
    tags
    seo { title description }
    priceRange {
      minVariantPrice { ...MoneyFields }
      maxVariantPrice { ...MoneyFields }
    }
    options { name optionValues { name } }
    images(first: 10) { nodes { ...ImageFields } }
    selectedVariant: variantBySelectedOptions(
      selectedOptions: $selectedOptions
      ignoreUnknownOptions: true
      caseInsensitiveMatch: true
    ) {
      ...ProductVariantFields
    }
    variants(first: $variantCount) { nodes { ...ProductVariantFields } }
  }
}
",
        variant_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

pub mod product_variants {
    use super::{InContext, Nodes, ProductVariantFields};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductVariantsFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductVariantsFields {
        pub variants: Nodes<ProductVariantFields>,
    }
}

storefront_operation!(
    /// Every variant of a product (up to Shopify's page maximum).
    ProductVariants,
    product_variants,
    concat!(
        r"query ProductVariants($country: CountryCode, $language: LanguageCode, $handle: String!)
  @inContext(country: $country, language: $language) {
  product(handle: $handle) {
    variants(first: 250) { nodes { ...ProductVariantFields } }
  }
}
",
        variant_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

// =============================================================================
// Cart
// =============================================================================

pub mod get_cart {
    use super::{CartFields, InContext};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

storefront_operation!(
    GetCart,
    get_cart,
    concat!(
        r"query GetCart($country: CountryCode, $language: LanguageCode, $cartId: ID!)
  @inContext(country: $country, language: $language) {
  cart(id: $cartId) { ...CartFields }
}
",
        cart_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

pub mod create_cart {
    use super::{CartMutationPayload, InContext};
    use crate::shopify::types::CartLineInput;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

storefront_operation!(
    CreateCart,
    create_cart,
    concat!(
        r"mutation CreateCart($country: CountryCode, $language: LanguageCode, $input: CartInput!)
  @inContext(country: $country, language: $language) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

pub mod add_to_cart {
    use super::{CartMutationPayload, InContext};
    use crate::shopify::types::CartLineInput;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

storefront_operation!(
    AddToCart,
    add_to_cart,
    concat!(
        r"mutation AddToCart($country: CountryCode, $language: LanguageCode, $cartId: ID!, $lines: [CartLineInput!]!)
  @inContext(country: $country, language: $language) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

pub mod update_cart_lines {
    use super::{CartMutationPayload, InContext};
    use crate::shopify::types::CartLineUpdateInput;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

storefront_operation!(
    UpdateCartLines,
    update_cart_lines,
    concat!(
        r"mutation UpdateCartLines($country: CountryCode, $language: LanguageCode, $cartId: ID!, $lines: [CartLineUpdateInput!]!)
  @inContext(country: $country, language: $language) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

pub mod remove_from_cart {
    use super::{CartMutationPayload, InContext};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        #[serde(flatten)]
        pub context: InContext,
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

storefront_operation!(
    RemoveFromCart,
    remove_from_cart,
    concat!(
        r"mutation RemoveFromCart($country: CountryCode, $language: LanguageCode, $cartId: ID!, $lineIds: [ID!]!)
  @inContext(country: $country, language: $language) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!(),
        money_fragment!(),
        image_fragment!()
    )
);

// =============================================================================
// Newsletter
// =============================================================================

pub mod customer_create {
    use super::UserErrorFields;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerCreateInput,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerCreateInput {
        pub email: String,
        pub password: String,
        pub accepts_marketing: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_create: Option<CustomerCreatePayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerCreatePayload {
        pub customer: Option<CustomerFields>,
        pub customer_user_errors: Vec<UserErrorFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CustomerFields {
        pub id: String,
        pub email: Option<String>,
    }
}

storefront_operation!(
    /// Newsletter sign-up: a customer with marketing consent.
    CustomerCreate,
    customer_create,
    r"mutation CustomerCreate($input: CustomerCreateInput!) {
  customerCreate(input: $input) {
    customer { id email }
    customerUserErrors { code field message }
  }
}
"
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn context() -> InContext {
        InContext {
            country: "US".to_string(),
            language: "EN".to_string(),
        }
    }

    #[test]
    fn test_operation_name_matches_document() {
        let body = ProductByHandle::build_query(product_by_handle::Variables {
            context: context(),
            handle: "widget".to_string(),
            selected_options: vec![],
            variant_count: 10,
        });
        assert_eq!(body.operation_name, "ProductByHandle");
        assert!(body.query.starts_with("query ProductByHandle("));
        assert!(body.query.contains("fragment ProductVariantFields"));
        assert!(body.query.contains("caseInsensitiveMatch: true"));
    }

    #[test]
    fn test_variables_serialize_camel_case_with_context() {
        let body = AllProducts::build_query(all_products::Variables {
            context: context(),
            first: 250,
            after: None,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "AllProducts");
        assert_eq!(json["variables"]["country"], "US");
        assert_eq!(json["variables"]["language"], "EN");
        assert_eq!(json["variables"]["first"], 250);
        assert!(json["variables"].get("after").is_none());

        let body = RemoveFromCart::build_query(remove_from_cart::Variables {
            context: context(),
            cart_id: "gid://shopify/Cart/1".to_string(),
            line_ids: vec!["L1".to_string()],
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/1");
        assert_eq!(json["variables"]["lineIds"][0], "L1");
    }

    #[test]
    fn test_every_document_declares_its_fragments() {
        let documents = [
            FeaturedCollection::build_query(featured_collection::Variables { context: context() })
                .query,
            RecommendedProducts::build_query(recommended_products::Variables {
                context: context(),
            })
            .query,
            GetCart::build_query(get_cart::Variables {
                context: context(),
                cart_id: String::new(),
            })
            .query,
        ];
        for document in documents {
            for fragment in ["MoneyFields", "ImageFields", "ProductCardFields", "CartFields"] {
                if document.contains(&format!("...{fragment}")) {
                    assert!(
                        document.contains(&format!("fragment {fragment} on")),
                        "missing fragment {fragment}"
                    );
                }
            }
        }
    }
}
