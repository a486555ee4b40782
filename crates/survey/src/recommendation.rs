//! Which product the finished survey reveals.

use storefront_catalog::Product;

/// Title of the product every finished survey recommends.
pub const RECOMMENDED_PRODUCT_TITLE: &str = "Personal Black Wolf";

/// Picks the recommended product out of the page's product list by exact title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationFilter {
    title: String,
}

impl Default for RecommendationFilter {
    fn default() -> Self {
        Self::new(RECOMMENDED_PRODUCT_TITLE)
    }
}

impl RecommendationFilter {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// First candidate whose title matches; `None` renders nothing.
    pub fn select<'a>(&self, candidates: &'a [Product]) -> Option<&'a Product> {
        let found = candidates.iter().find(|p| p.title() == self.title);
        if found.is_none() {
            tracing::warn!(
                title = %self.title,
                candidates = candidates.len(),
                "recommended product not among candidates"
            );
        }
        found
    }
}
