//! # Domain Types
//!
//! The menu resources mirrored by the client caches.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Menu Resources                                  │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   Restaurant    │──┬──────────────┬──────────────────┐              │
//! │  │  id, slug, name │  │              │                  │              │
//! │  └─────────────────┘  ▼              ▼                  ▼              │
//! │              ┌──────────────┐ ┌──────────────┐ ┌──────────────┐        │
//! │              │   Category   │ │  HeroSlide   │ │   Favorite   │        │
//! │              │  name        │ │  position ★  │ │ (per session)│        │
//! │              └──────┬───────┘ └──────────────┘ └──────────────┘        │
//! │                     ▼                                                   │
//! │              ┌──────────────┐                                           │
//! │              │     Dish     │   ★ = orderable: position is dense       │
//! │              │  price       │       and unique within its scope        │
//! │              │  position ★  │       (category for dishes, restaurant   │
//! │              └──────────────┘        for hero slides)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each resource comes with a `Draft` (create input), a `Patch` (partial
//! update; `None` means "leave unchanged") and a `Filter` (list query).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1600 bps = 16%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Restaurant
// =============================================================================

/// A restaurant owning a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    /// URL-safe public handle used by the QR menu links.
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDraft {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantFilter {
    pub active_only: bool,
}

// =============================================================================
// Category
// =============================================================================

/// A menu section ("Burgers", "Drinks") within a restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub restaurant_id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilter {
    pub restaurant_id: Option<String>,
}

// =============================================================================
// Dish
// =============================================================================

/// An option a customer may pick for a dish ("Size: Large", "+ Bacon").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DishOption {
    /// Option group, e.g. "Size" or "Extras".
    pub group: String,
    pub name: String,
    /// Surcharge added to the dish price. Zero for free choices.
    pub price: Money,
}

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Dish {
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    pub is_available: bool,
    /// Dense 0-based index within the category.
    pub position: i64,
    #[serde(default)]
    pub options: Vec<DishOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishDraft {
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    #[serde(default)]
    pub options: Vec<DishOption>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishPatch {
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub options: Option<Vec<DishOption>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishFilter {
    pub restaurant_id: Option<String>,
    pub category_id: Option<String>,
}

// =============================================================================
// Hero Slide
// =============================================================================

/// A banner slide shown at the top of a restaurant's public menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HeroSlide {
    pub id: String,
    pub restaurant_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    /// Dense 0-based index within the restaurant.
    pub position: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlideDraft {
    pub restaurant_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlidePatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlideFilter {
    pub restaurant_id: Option<String>,
}

// =============================================================================
// Favorite
// =============================================================================

/// A restaurant bookmarked by the signed-in user. Session-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Favorite {
    pub id: String,
    pub restaurant_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteDraft {
    pub restaurant_id: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
