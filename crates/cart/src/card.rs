use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{Product, ProductId, Variant, VariantId};
use storefront_core::{Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, ValueObject};
use storefront_events::Event;

use crate::collaborators::{Analytics, CartMutation};

/// Quantity chosen in the stepper. Always within `[MIN, MAX]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl ValueObject for Quantity {}

impl Quantity {
    pub const MIN: Quantity = Quantity(1);
    pub const MAX: Quantity = Quantity(999);

    /// Accepts only values in `[1, 999]`.
    pub fn new(value: i64) -> Option<Self> {
        let v = u32::try_from(value).ok()?;
        (Self::MIN.0..=Self::MAX.0).contains(&v).then_some(Self(v))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// One more, unless already at the maximum.
    pub fn increased(self) -> Option<Self> {
        (self < Self::MAX).then(|| Self(self.0 + 1))
    }

    /// One less, unless already at the minimum.
    pub fn decreased(self) -> Option<Self> {
        (self > Self::MIN).then(|| Self(self.0 - 1))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::MIN
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quantity::new(value)
            .ok_or_else(|| DomainError::validation(format!("quantity out of range: {value}")))
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

/// What the shopper has picked on one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub chosen_variant_index: usize,
    pub quantity: Quantity,
}

/// Aggregate root: one mounted product card.
///
/// Mounting a card for a different product means building a new `ProductCard`;
/// the selection never carries over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    id: AggregateId,
    product: Product,
    selection: SelectionState,
    version: u64,
}

impl ProductCard {
    /// Mount a card: first variant selected, quantity 1.
    pub fn mount(product: Product) -> Self {
        Self::mount_with_id(AggregateId::new(), product)
    }

    pub fn mount_with_id(id: AggregateId, product: Product) -> Self {
        Self {
            id,
            product,
            selection: SelectionState::default(),
            version: 0,
        }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn quantity(&self) -> Quantity {
        self.selection.quantity
    }

    pub fn selected_variant(&self) -> &Variant {
        // Only validated indices are ever applied; index 0 always exists.
        &self.product.variants()[self.selection.chosen_variant_index]
    }

    /// Add the selected variant in the chosen quantity to the cart.
    ///
    /// Analytics (when present and the product belongs to a collection) is
    /// notified first, then the cart. Fails without calling either when the
    /// product or the selected variant cannot be bought.
    pub fn add_to_cart(
        &self,
        cart: &dyn CartMutation,
        analytics: Option<&dyn Analytics>,
    ) -> DomainResult<()> {
        if self.product.is_unavailable() {
            return Err(DomainError::invariant("item currently unavailable"));
        }

        let variant = self.selected_variant();
        if !variant.available_for_sale {
            return Err(DomainError::validation(format!(
                "variant {} is sold out",
                variant.id
            )));
        }

        if let (Some(analytics), Some(collection)) = (analytics, self.product.first_collection()) {
            analytics.register_in_cart(collection, &variant.title);
        }

        tracing::debug!(
            product_id = %self.product.id_typed(),
            variant_id = %variant.id,
            quantity = self.selection.quantity.get(),
            "adding variant to cart"
        );
        cart.add_variant_to_cart(&variant.id, self.selection.quantity);
        Ok(())
    }
}

impl AggregateRoot for ProductCard {
    type Id = AggregateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SelectVariant (variant dropdown change).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectVariant {
    pub index: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Command: IncreaseQuantity (stepper "+").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreaseQuantity {
    pub occurred_at: DateTime<Utc>,
}

/// Command: DecreaseQuantity (stepper "-").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecreaseQuantity {
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetQuantity (typed into the quantity field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQuantity {
    pub value: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCardCommand {
    SelectVariant(SelectVariant),
    IncreaseQuantity(IncreaseQuantity),
    DecreaseQuantity(DecreaseQuantity),
    SetQuantity(SetQuantity),
}

/// Event: VariantSelected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSelected {
    pub card_id: AggregateId,
    pub product_id: ProductId,
    pub index: usize,
    pub variant_id: VariantId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChanged {
    pub card_id: AggregateId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCardEvent {
    VariantSelected(VariantSelected),
    QuantityChanged(QuantityChanged),
}

impl Event for ProductCardEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductCardEvent::VariantSelected(_) => "cart.card.variant_selected",
            ProductCardEvent::QuantityChanged(_) => "cart.card.quantity_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductCardEvent::VariantSelected(e) => e.occurred_at,
            ProductCardEvent::QuantityChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ProductCard {
    type Command = ProductCardCommand;
    type Event = ProductCardEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductCardEvent::VariantSelected(e) => {
                self.selection.chosen_variant_index = e.index;
            }
            ProductCardEvent::QuantityChanged(e) => {
                self.selection.quantity = e.quantity;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCardCommand::SelectVariant(cmd) => self.handle_select_variant(cmd),
            ProductCardCommand::IncreaseQuantity(cmd) => {
                Ok(self.quantity_changed(self.selection.quantity.increased(), cmd.occurred_at))
            }
            ProductCardCommand::DecreaseQuantity(cmd) => {
                Ok(self.quantity_changed(self.selection.quantity.decreased(), cmd.occurred_at))
            }
            // Out-of-range input is ignored, like the bounded number field it models.
            ProductCardCommand::SetQuantity(cmd) => {
                Ok(self.quantity_changed(Quantity::new(cmd.value), cmd.occurred_at))
            }
        }
    }
}

impl ProductCard {
    fn handle_select_variant(
        &self,
        cmd: &SelectVariant,
    ) -> Result<Vec<ProductCardEvent>, DomainError> {
        let variant = self.product.variant(cmd.index).ok_or_else(|| {
            DomainError::validation(format!(
                "variant index {} out of range ({} variants)",
                cmd.index,
                self.product.variants().len()
            ))
        })?;

        if !variant.available_for_sale {
            return Err(DomainError::validation(format!(
                "variant {} is sold out",
                variant.id
            )));
        }

        if cmd.index == self.selection.chosen_variant_index {
            return Ok(vec![]);
        }

        Ok(vec![ProductCardEvent::VariantSelected(VariantSelected {
            card_id: self.id,
            product_id: self.product.id_typed().clone(),
            index: cmd.index,
            variant_id: variant.id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn quantity_changed(
        &self,
        next: Option<Quantity>,
        occurred_at: DateTime<Utc>,
    ) -> Vec<ProductCardEvent> {
        match next {
            Some(quantity) if quantity != self.selection.quantity => {
                vec![ProductCardEvent::QuantityChanged(QuantityChanged {
                    card_id: self.id,
                    quantity,
                    occurred_at,
                })]
            }
            _ => vec![],
        }
    }
}
