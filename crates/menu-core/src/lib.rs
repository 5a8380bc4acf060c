//! # menu-core: Pure Business Logic for the Menu Client
//!
//! Every rule that can be stated without touching the network, the disk or
//! a clock lives here: money arithmetic, cart aggregation, the position
//! splice used by drag-and-drop reordering, and form validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Menu Client Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      UI consumers (external)                    │   │
//! │  │    Menu editor ──► Dish list ──► Cart drawer ──► Checkout       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ subscribe / invoke                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  menu-store (async caches)                      │   │
//! │  │   ResourceStore<R>, PositionReorderController, Cart engine      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ menu-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ ordering  │  │   │
//! │  │   │   Dish    │  │   Money   │  │ Shopping  │  │  splice   │  │   │
//! │  │   │ HeroSlide │  │  TaxRate  │  │   Cart    │  │ renumber  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO TIMERS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Menu resources (Restaurant, Category, Dish, HeroSlide, Favorite)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Shopping cart line items and total recomputation
//! - [`ordering`] - List splice and contiguous position renumbering
//! - [`error`] - Domain error types
//! - [`validation`] - Pre-flight form validation
//!
//! ## Example Usage
//!
//! ```rust
//! use menu_core::cart::{CartItem, ShoppingCart};
//! use menu_core::money::Money;
//! use menu_core::types::TaxRate;
//!
//! let mut cart = ShoppingCart::new(TaxRate::from_bps(1600));
//! cart.add_item(CartItem::new("burger-1", "Burger", 2, Money::from_cents(1000), vec![]))
//!     .unwrap();
//!
//! assert_eq!(cart.subtotal.cents(), 2000);
//! assert_eq!(cart.taxes.cents(), 320);
//! assert_eq!(cart.total.cents(), 2320);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod ordering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartItem, PromotionCartItem, SelectedOption, ShoppingCart};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use ordering::PositionUpdate;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate applied to the cart subtotal (16%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1600;

/// Maximum distinct lines (items + promotions) allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Upper bound for a dish price in cents ($10,000.00).
pub const MAX_PRICE_CENTS: i64 = 1_000_000;
