use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, Money};

/// Title of the collection whose products are made to order.
pub const PERSONAL_COLLECTION: &str = "Personal";

/// Product identifier (opaque storefront id, e.g. a GraphQL global id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Variant identifier (opaque storefront id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

macro_rules! impl_opaque_id {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn new(id: impl Into<String>) -> DomainResult<Self> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, ": empty")));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

impl_opaque_id!(ProductId, "ProductId");
impl_opaque_id!(VariantId, "VariantId");

/// A purchasable SKU of a product, distinguished by packaging size/format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub title: String,
    pub unit_price: Money,
    pub available_for_sale: bool,
}

impl Entity for Variant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Read-only product record. Always has at least one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    title: String,
    variants: Vec<Variant>,
    description_html: String,
    collections: Vec<String>,
}

impl Product {
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        variants: Vec<Variant>,
        description_html: impl Into<String>,
        collections: Vec<String>,
    ) -> DomainResult<Self> {
        if variants.is_empty() {
            return Err(DomainError::validation(format!(
                "product {id} has no variants"
            )));
        }

        Ok(Self {
            id,
            title: title.into(),
            variants,
            description_html: description_html.into(),
            collections,
        })
    }

    pub fn id_typed(&self) -> &ProductId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn variant(&self, index: usize) -> Option<&Variant> {
        self.variants.get(index)
    }

    pub fn description_html(&self) -> &str {
        &self.description_html
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    pub fn first_collection(&self) -> Option<&str> {
        self.collections.first().map(String::as_str)
    }

    /// Made-to-order products live in the "Personal" collection.
    pub fn is_personal(&self) -> bool {
        self.first_collection() == Some(PERSONAL_COLLECTION)
    }

    /// A single-variant product whose only variant is sold out cannot be bought.
    ///
    /// Multi-variant products stay purchasable; their sold-out variants are
    /// disabled individually.
    pub fn is_unavailable(&self) -> bool {
        self.variants.len() < 2 && !self.variants[0].available_for_sale
    }

    pub fn has_variant_choice(&self) -> bool {
        self.variants.len() > 1
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// -------------------------
// Storefront API shape
// -------------------------

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: String,
    title: String,
    #[serde(default)]
    description_html: String,
    variants: Connection<VariantNode>,
    #[serde(default)]
    collections: Connection<CollectionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    id: String,
    #[serde(default)]
    title: String,
    price: Money,
    #[serde(default = "default_available")]
    available_for_sale: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionNode {
    title: String,
}

fn default_available() -> bool {
    true
}

impl TryFrom<ProductNode> for Product {
    type Error = DomainError;

    fn try_from(node: ProductNode) -> Result<Self, Self::Error> {
        let variants = node
            .variants
            .edges
            .into_iter()
            .map(|edge| {
                let v = edge.node;
                Ok(Variant {
                    id: VariantId::new(v.id)?,
                    title: v.title,
                    unit_price: v.price,
                    available_for_sale: v.available_for_sale,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let collections = node
            .collections
            .edges
            .into_iter()
            .map(|edge| edge.node.title)
            .collect();

        Product::new(
            ProductId::new(node.id)?,
            node.title,
            variants,
            node.description_html,
            collections,
        )
    }
}

/// Parse a storefront product list (`[{ "node": { ... } }, ...]`).
///
/// Variants and collections use the same `{ "edges": [{ "node": ... }] }`
/// connection shape. A malformed record fails the whole list.
pub fn parse_product_edges(json: &str) -> DomainResult<Vec<Product>> {
    let edges: Vec<Edge<ProductNode>> = serde_json::from_str(json)
        .map_err(|e| DomainError::validation(format!("malformed product list: {e}")))?;

    edges
        .into_iter()
        .map(|edge| Product::try_from(edge.node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, title: &str, cents: u64, available: bool) -> Variant {
        Variant {
            id: VariantId::new(id).unwrap(),
            title: title.to_string(),
            unit_price: Money::from_cents(cents),
            available_for_sale: available,
        }
    }

    #[test]
    fn product_requires_variants() {
        let err = Product::new(
            ProductId::new("p1").unwrap(),
            "Black Wolf",
            vec![],
            "",
            vec![],
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn ids_reject_blank_values() {
        assert!(ProductId::new("  ").is_err());
        assert!(VariantId::new("").is_err());
    }

    #[test]
    fn single_sold_out_variant_makes_product_unavailable() {
        let product = Product::new(
            ProductId::new("p1").unwrap(),
            "Espresso",
            vec![variant("v1", "250g", 1200, false)],
            "",
            vec![],
        )
        .unwrap();
        assert!(product.is_unavailable());
        assert!(!product.has_variant_choice());
    }

    #[test]
    fn multi_variant_product_stays_available_when_first_is_sold_out() {
        let product = Product::new(
            ProductId::new("p1").unwrap(),
            "Espresso",
            vec![variant("v1", "250g", 1200, false), variant("v2", "1kg", 4000, true)],
            "",
            vec![],
        )
        .unwrap();
        assert!(!product.is_unavailable());
        assert!(product.has_variant_choice());
    }

    #[test]
    fn parses_storefront_edges() {
        let json = r#"[
          {
            "node": {
              "id": "gid://shopify/Product/1",
              "title": "Personal Black Wolf",
              "descriptionHtml": "<p>Roasted for you</p>",
              "variants": { "edges": [
                { "node": { "id": "gid://shopify/ProductVariant/11", "title": "250g", "price": "12.00", "availableForSale": true } },
                { "node": { "id": "gid://shopify/ProductVariant/12", "title": "1kg", "price": "40.00", "availableForSale": false } }
              ] },
              "collections": { "edges": [ { "node": { "title": "Personal" } } ] }
            }
          }
        ]"#;

        let products = parse_product_edges(json).unwrap();
        assert_eq!(products.len(), 1);

        let product = &products[0];
        assert_eq!(product.title(), "Personal Black Wolf");
        assert_eq!(product.id_typed().as_str(), "gid://shopify/Product/1");
        assert!(product.is_personal());
        assert_eq!(product.variants().len(), 2);
        assert_eq!(product.variant(0).unwrap().unit_price, Money::from_cents(1200));
        assert!(!product.variant(1).unwrap().available_for_sale);
    }

    #[test]
    fn parse_rejects_product_without_variants() {
        let json = r#"[{ "node": { "id": "p", "title": "Empty", "variants": { "edges": [] } } }]"#;
        assert!(parse_product_edges(json).is_err());
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let json = r#"[{ "node": { "id": "p", "title": "Plain",
            "variants": { "edges": [ { "node": { "id": "v", "title": "500g", "price": 19.5 } } ] } } }]"#;
        let products = parse_product_edges(json).unwrap();
        assert_eq!(products[0].first_collection(), None);
        assert!(!products[0].is_personal());
        assert_eq!(products[0].variants()[0].unit_price, Money::from_cents(1950));
        assert!(products[0].variants()[0].available_for_sale);
    }
}
