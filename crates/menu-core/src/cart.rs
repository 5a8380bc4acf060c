//! # Shopping Cart
//!
//! Line items, promotion bundles and the total recomputation that keeps
//! them consistent.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Mutations                                   │
//! │                                                                         │
//! │  add_item(item) ──────────┐                                            │
//! │  add_promotion(promo) ────┤   merge on identity key                    │
//! │  update_quantity(..) ─────┤   ──────────────────────►  recompute()     │
//! │  remove_item(..) ─────────┤                             │              │
//! │  remove_promotion(..) ────┤                             ▼              │
//! │  clear() ─────────────────┘           subtotal = Σ item.total_price   │
//! │                                                  + Σ promo.total_price │
//! │                                       taxes    = subtotal × tax_rate   │
//! │                                       total    = subtotal + taxes      │
//! │                                                  − discount            │
//! │                                       total_items = Σ quantities       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are never adjusted incrementally. Every mutation ends in a full
//! `recompute()`, so the invariants hold by construction.
//!
//! ## Identity Keys
//! - Dish lines: `(dish id, options key)`. The options key is canonical:
//!   the same options picked in a different order produce the same key.
//! - Promotion lines: `promotion_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TaxRate;
use crate::validation::validate_quantity;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Items
// =============================================================================

/// An option chosen for a dish line ("Size: Large" at +$2.00).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SelectedOption {
    pub group: String,
    pub name: String,
    pub price: Money,
}

/// Canonical serialization of a set of selected options.
///
/// Options are sorted by `(group, name)` and serialized as JSON pairs, so
/// `[Size: L, Extra: Bacon]` and `[Extra: Bacon, Size: L]` share a key.
///
/// ```rust
/// use menu_core::cart::{options_key, SelectedOption};
/// use menu_core::Money;
///
/// let bacon = SelectedOption { group: "Extra".into(), name: "Bacon".into(), price: Money::from_cents(150) };
/// let large = SelectedOption { group: "Size".into(), name: "L".into(), price: Money::from_cents(200) };
///
/// assert_eq!(
///     options_key(&[bacon.clone(), large.clone()]),
///     options_key(&[large, bacon]),
/// );
/// assert_eq!(options_key(&[]), "[]");
/// ```
pub fn options_key(options: &[SelectedOption]) -> String {
    let mut pairs: Vec<(&str, &str)> = options
        .iter()
        .map(|o| (o.group.as_str(), o.name.as_str()))
        .collect();
    pairs.sort_unstable();
    // Serializing plain string pairs cannot fail.
    serde_json::to_string(&pairs).unwrap_or_default()
}

/// A dish line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    /// Dish id.
    pub id: String,
    /// Dish name at time of adding (frozen).
    pub name: String,
    pub quantity: i64,
    /// Dish price at time of adding (frozen), without options.
    pub unit_price: Money,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    /// `quantity × (unit_price + Σ option prices)`.
    pub total_price: Money,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Builds a dish line, pricing it as `quantity × (unit_price + options)`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        selected_options: Vec<SelectedOption>,
    ) -> Self {
        let surcharge: Money = selected_options.iter().map(|o| o.price).sum();
        CartItem {
            id: id.into(),
            name: name.into(),
            quantity,
            unit_price,
            total_price: (unit_price + surcharge) * quantity,
            selected_options,
            added_at: Utc::now(),
        }
    }

    /// Canonical key of this line's options.
    pub fn options_key(&self) -> String {
        options_key(&self.selected_options)
    }

    fn matches(&self, id: &str, key: Option<&str>) -> bool {
        self.id == id && key.map_or(true, |k| self.options_key() == k)
    }
}

/// A promotion bundle line in the cart.
///
/// `total_price` is already net of `discount`:
/// `quantity × (original_price − discount)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PromotionCartItem {
    /// Cart line id.
    pub id: String,
    pub promotion_id: String,
    pub name: String,
    pub quantity: i64,
    /// Regular price of the bundle, per unit.
    pub original_price: Money,
    /// Saving per unit, `0 <= discount <= original_price`.
    pub discount: Money,
    pub total_price: Money,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl PromotionCartItem {
    pub fn new(
        promotion_id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        original_price: Money,
        discount: Money,
    ) -> Self {
        let discount = discount.clamp_between(Money::zero(), original_price);
        PromotionCartItem {
            id: Uuid::new_v4().to_string(),
            promotion_id: promotion_id.into(),
            name: name.into(),
            quantity,
            original_price,
            discount,
            total_price: (original_price - discount) * quantity,
            added_at: Utc::now(),
        }
    }
}

// =============================================================================
// Shopping Cart
// =============================================================================

/// The session's shopping cart.
///
/// ## Invariants (after every public mutation)
/// - `subtotal == Σ items.total_price + Σ promotions.total_price`
/// - `taxes == subtotal × tax_rate`
/// - `total == subtotal + taxes − discount`
/// - `total_items == Σ quantities`
/// - no two lines share an identity key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShoppingCart {
    pub items: Vec<CartItem>,
    pub promotions: Vec<PromotionCartItem>,
    pub total_items: i64,
    pub subtotal: Money,
    pub taxes: Money,
    /// Cart-level discount actually applied (never more than subtotal + taxes).
    pub discount: Money,
    pub total: Money,
    pub tax_rate: TaxRate,
    /// Cart-level discount requested via `set_discount`.
    #[serde(default)]
    pub requested_discount: Money,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Default for ShoppingCart {
    fn default() -> Self {
        ShoppingCart::new(TaxRate::default())
    }
}

impl ShoppingCart {
    /// Creates an empty cart.
    pub fn new(tax_rate: TaxRate) -> Self {
        ShoppingCart {
            items: Vec::new(),
            promotions: Vec::new(),
            total_items: 0,
            subtotal: Money::zero(),
            taxes: Money::zero(),
            discount: Money::zero(),
            total: Money::zero(),
            tax_rate,
            requested_discount: Money::zero(),
            updated_at: Utc::now(),
        }
    }

    /// Number of distinct lines (items + promotions).
    pub fn line_count(&self) -> usize {
        self.items.len() + self.promotions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_count() == 0
    }

    /// Finds a dish line by identity key.
    pub fn find_item(&self, id: &str, options_key: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.matches(id, Some(options_key)))
    }

    pub fn find_promotion(&self, promotion_id: &str) -> Option<&PromotionCartItem> {
        self.promotions
            .iter()
            .find(|p| p.promotion_id == promotion_id)
    }

    /// Adds a dish line, merging into an existing line with the same key.
    ///
    /// ## Behavior
    /// - Same `(id, options key)` already present: quantity and total_price
    ///   are added to the existing line.
    /// - Otherwise: appended as a new line.
    pub fn add_item(&mut self, item: CartItem) -> CoreResult<()> {
        validate_quantity(item.quantity)?;
        let key = item.options_key();

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.matches(&item.id, Some(&key)))
        {
            let merged = existing.quantity + item.quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = merged;
            existing.total_price += item.total_price;
        } else {
            self.ensure_room()?;
            self.items.push(item);
        }

        self.recompute();
        Ok(())
    }

    /// Adds a promotion line, merging by `promotion_id`.
    pub fn add_promotion(&mut self, promo: PromotionCartItem) -> CoreResult<()> {
        validate_quantity(promo.quantity)?;

        if let Some(existing) = self
            .promotions
            .iter_mut()
            .find(|p| p.promotion_id == promo.promotion_id)
        {
            let merged = existing.quantity + promo.quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = merged;
            existing.total_price += promo.total_price;
        } else {
            self.ensure_room()?;
            self.promotions.push(promo);
        }

        self.recompute();
        Ok(())
    }

    /// Removes dish lines with this id. With an options key only that exact
    /// line is removed, otherwise every line of the dish.
    ///
    /// Returns the number of lines removed (zero is not an error).
    pub fn remove_item(&mut self, id: &str, options_key: Option<&str>) -> usize {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(id, options_key));
        let removed = before - self.items.len();
        self.recompute();
        removed
    }

    /// Removes the promotion line. Returns the number of lines removed.
    pub fn remove_promotion(&mut self, promotion_id: &str) -> usize {
        let before = self.promotions.len();
        self.promotions.retain(|p| p.promotion_id != promotion_id);
        let removed = before - self.promotions.len();
        self.recompute();
        removed
    }

    /// Sets a dish line's quantity, scaling its total by the line's own
    /// per-unit rate.
    ///
    /// ## Behavior
    /// - `new_quantity` below 1 is clamped to 1.
    /// - `total_price` becomes `total_price / old × new`, so option
    ///   surcharges baked into the total scale proportionally.
    /// - Without an options key every line of the dish is updated.
    /// - A targeted line with quantity 0 fails the whole call with
    ///   `ZeroQuantityEntry` and nothing is changed.
    pub fn update_quantity(
        &mut self,
        id: &str,
        new_quantity: i64,
        options_key: Option<&str>,
    ) -> CoreResult<()> {
        let new_quantity = clamp_quantity(new_quantity)?;

        let mut targets = self
            .items
            .iter_mut()
            .filter(|i| i.matches(id, options_key))
            .peekable();
        if targets.peek().is_none() {
            return Err(CoreError::ItemNotInCart { id: id.to_string() });
        }

        // Scale every target first; commit only if all succeed.
        let mut scaled = Vec::new();
        for item in targets {
            let total = item
                .total_price
                .rescale(item.quantity, new_quantity)
                .ok_or_else(|| CoreError::ZeroQuantityEntry {
                    id: item.id.clone(),
                })?;
            scaled.push((item, total));
        }
        for (item, total) in scaled {
            item.quantity = new_quantity;
            item.total_price = total;
        }

        self.recompute();
        Ok(())
    }

    /// Sets a promotion line's quantity with the same clamping and scaling
    /// rules as [`ShoppingCart::update_quantity`].
    pub fn update_promotion_quantity(
        &mut self,
        promotion_id: &str,
        new_quantity: i64,
    ) -> CoreResult<()> {
        let new_quantity = clamp_quantity(new_quantity)?;

        let promo = self
            .promotions
            .iter_mut()
            .find(|p| p.promotion_id == promotion_id)
            .ok_or_else(|| CoreError::PromotionNotInCart {
                promotion_id: promotion_id.to_string(),
            })?;

        let total = promo
            .total_price
            .rescale(promo.quantity, new_quantity)
            .ok_or_else(|| CoreError::ZeroQuantityEntry {
                id: promo.promotion_id.clone(),
            })?;
        promo.quantity = new_quantity;
        promo.total_price = total;

        self.recompute();
        Ok(())
    }

    /// Requests a cart-level discount. Negative amounts count as zero.
    pub fn set_discount(&mut self, amount: Money) {
        self.requested_discount = if amount.is_negative() {
            Money::zero()
        } else {
            amount
        };
        self.recompute();
    }

    /// Changes the tax rate and recomputes.
    pub fn set_tax_rate(&mut self, rate: TaxRate) {
        self.tax_rate = rate;
        self.recompute();
    }

    /// Empties both line lists and drops any cart-level discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.promotions.clear();
        self.requested_discount = Money::zero();
        self.recompute();
    }

    /// Σ per-unit promotion savings × quantity. Informational only.
    pub fn promotion_savings(&self) -> Money {
        self.promotions.iter().map(|p| p.discount * p.quantity).sum()
    }

    /// Recomputes every derived total from the line lists.
    pub fn recompute(&mut self) {
        let items_total: Money = self.items.iter().map(|i| i.total_price).sum();
        let promos_total: Money = self.promotions.iter().map(|p| p.total_price).sum();

        self.subtotal = items_total + promos_total;
        self.taxes = self.subtotal.calculate_tax(self.tax_rate);
        self.discount = self
            .requested_discount
            .clamp_between(Money::zero(), self.subtotal + self.taxes);
        self.total = self.subtotal + self.taxes - self.discount;
        self.total_items = self.items.iter().map(|i| i.quantity).sum::<i64>()
            + self.promotions.iter().map(|p| p.quantity).sum::<i64>();
        self.updated_at = Utc::now();
    }

    fn ensure_room(&self) -> CoreResult<()> {
        if self.line_count() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        Ok(())
    }
}

fn clamp_quantity(quantity: i64) -> CoreResult<i64> {
    let quantity = quantity.max(1);
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
