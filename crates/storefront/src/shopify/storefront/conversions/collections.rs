//! Collection type conversion functions.

use crate::shopify::types::Collection;

use super::super::queries::featured_collection;

pub fn convert_collection(c: featured_collection::CollectionFields) -> Collection {
    Collection {
        id: c.id,
        handle: c.handle,
        title: c.title,
        image: c.image.map(Into::into),
    }
}
