//! Product card domain module.
//!
//! This crate contains the selection state of one displayed product (chosen
//! variant, quantity stepper), the add-to-cart hand-off to external
//! collaborators, and the card's render-ready view model. No rendering, no IO.

pub mod card;
pub mod collaborators;
pub mod view;

pub use card::{
    DecreaseQuantity, IncreaseQuantity, ProductCard, ProductCardCommand, ProductCardEvent,
    Quantity, QuantityChanged, SelectVariant, SelectionState, SetQuantity, VariantSelected,
};
pub use collaborators::{Analytics, CartMutation};
pub use view::{
    ProductCardView, UNAVAILABLE_MESSAGE, VariantOption, render,
};
