//! Outbound collaborators invoked when the shopper presses "add to cart".
//!
//! Both calls are fire-and-forget: nothing they return is consumed.

use storefront_catalog::VariantId;

use crate::card::Quantity;

/// Cart mutation owned by the checkout layer.
pub trait CartMutation {
    fn add_variant_to_cart(&self, variant_id: &VariantId, quantity: Quantity);
}

/// Best-effort analytics hook, invoked immediately before the cart mutation.
pub trait Analytics {
    fn register_in_cart(&self, collection_title: &str, variant_title: &str);
}

impl<F> CartMutation for F
where
    F: Fn(&VariantId, Quantity),
{
    fn add_variant_to_cart(&self, variant_id: &VariantId, quantity: Quantity) {
        self(variant_id, quantity)
    }
}
