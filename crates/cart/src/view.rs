//! Render-ready view model of a product card.
//!
//! Everything the markup layer needs, already decided and formatted: which
//! blocks are visible, the de-DE price strings, the labels.

use serde::Serialize;

use storefront_catalog::{PERSONAL_COLLECTION, Product, derive_prices};
use storefront_core::AggregateRoot;

use crate::card::{ProductCard, Quantity};

pub const UNAVAILABLE_MESSAGE: &str = "Der Artikel ist derzeit leider nicht verfügbar.";
pub const SOLD_OUT_SUFFIX: &str = " (Ausverkauft)";
pub const VAT_NOTE: &str = "Alle Preise inkl. MwSt.";
pub const ADD_TO_CART_LABEL: &str = "In den Einkaufswagen";

const DELIVERY_MADE_TO_ORDER: &str = "Lieferzeit: 7-9 Tage";
const DELIVERY_STANDARD: &str = "Lieferzeit: 3-5 Tage";
const SUBSCRIPTION_MARKER: &str = "Abo";

/// One entry of the variant dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    pub index: usize,
    pub label: String,
    pub disabled: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCardView {
    /// Hidden for made-to-order ("Personal") products.
    pub title: Option<String>,
    pub description_html: String,
    /// Set when the product cannot be bought; stepper and selector are hidden.
    pub unavailable_message: Option<&'static str>,
    /// `None` while unavailable.
    pub quantity: Option<Quantity>,
    /// Dropdown entries; only for purchasable products with several variants.
    pub variant_options: Option<Vec<VariantOption>>,
    /// Unit price × quantity, e.g. "25,98 €".
    pub total_line: String,
    /// e.g. "(48,00 € pro kg)"; absent when the title carries no weight.
    pub kilogram_line: Option<String>,
    /// e.g. "0,29 € pro Tasse"; absent when the title carries no weight.
    pub serving_line: Option<String>,
    /// Subscription variants get a "Best offer" badge under the cup price.
    pub best_offer: bool,
    pub delivery_line: &'static str,
    pub vat_note: &'static str,
    pub add_to_cart_label: &'static str,
    pub add_to_cart_enabled: bool,
}

/// Build the view model for the card's current state.
pub fn render(card: &ProductCard) -> ProductCardView {
    let product = card.product();
    let variant = card.selected_variant();
    let unavailable = product.is_unavailable();

    let prices = derive_prices(&variant.title, variant.unit_price);

    let total_line = match variant.unit_price.checked_mul(card.quantity().get()) {
        Ok(total) => format!("{total} €"),
        Err(err) => {
            tracing::warn!(card_id = %card.id(), error = %err, "line total not computable");
            String::new()
        }
    };

    ProductCardView {
        // shown only for products filed under a non-personal collection
        title: product
            .first_collection()
            .is_some_and(|c| c != PERSONAL_COLLECTION)
            .then(|| product.title().to_string()),
        description_html: product.description_html().to_string(),
        unavailable_message: unavailable.then_some(UNAVAILABLE_MESSAGE),
        quantity: (!unavailable).then(|| card.quantity()),
        variant_options: (!unavailable && product.has_variant_choice())
            .then(|| variant_options(product, card.selection().chosen_variant_index)),
        total_line,
        kilogram_line: prices.map(|p| p.kilogram_line()),
        serving_line: prices.map(|p| p.serving_line()),
        best_offer: prices.is_some() && variant.title.contains(SUBSCRIPTION_MARKER),
        delivery_line: if product.is_personal() {
            DELIVERY_MADE_TO_ORDER
        } else {
            DELIVERY_STANDARD
        },
        vat_note: VAT_NOTE,
        add_to_cart_label: ADD_TO_CART_LABEL,
        add_to_cart_enabled: !unavailable && variant.available_for_sale,
    }
}

fn variant_options(product: &Product, selected: usize) -> Vec<VariantOption> {
    product
        .variants()
        .iter()
        .enumerate()
        .map(|(index, v)| VariantOption {
            index,
            label: if v.available_for_sale {
                v.title.clone()
            } else {
                format!("{}{}", v.title, SOLD_OUT_SUFFIX)
            },
            disabled: !v.available_for_sale,
            selected: index == selected,
        })
        .collect()
}
