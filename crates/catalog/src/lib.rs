//! Catalog domain module.
//!
//! Read-only product records as supplied by the storefront API, plus the
//! price normalization applied to the selected variant (per serving / per kg).
//! Pure domain logic: no fetching, no caching.

pub mod pricing;
pub mod product;

pub use pricing::{
    DerivedPrices, FALLBACK_GRAMS, SERVINGS_PER_PACKAGE, WeightBasis, derive_prices,
};
pub use product::{
    PERSONAL_COLLECTION, Product, ProductId, Variant, VariantId, parse_product_edges,
};
