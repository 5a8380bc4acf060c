//! # Resource Contracts
//!
//! What the generic store needs to know about each cached type.
//!
//! ```text
//! ┌──────────────┬──────────────┬───────────┬────────────────┬──────────────┐
//! │ Resource     │ Kind name    │ Orderable │ Scope          │ Session only │
//! ├──────────────┼──────────────┼───────────┼────────────────┼──────────────┤
//! │ Restaurant   │ restaurants  │           │                │              │
//! │ Category     │ categories   │           │                │              │
//! │ Dish         │ dishes       │ base 0    │ category_id    │              │
//! │ HeroSlide    │ hero_slides  │ base 0    │ restaurant_id  │              │
//! │ Favorite     │ favorites    │           │                │ yes          │
//! └──────────────┴──────────────┴───────────┴────────────────┴──────────────┘
//! ```

use std::fmt::{self, Debug};

use menu_core::validation::{
    validate_category_draft, validate_category_patch, validate_dish_draft, validate_dish_patch,
    validate_hero_slide_draft, validate_hero_slide_patch, validate_restaurant_draft,
    validate_restaurant_patch,
};
use menu_core::{
    Category, CategoryDraft, CategoryFilter, CategoryPatch, Dish, DishDraft, DishFilter,
    DishPatch, Favorite, FavoriteDraft, HeroSlide, HeroSlideDraft, HeroSlideFilter,
    HeroSlidePatch, Restaurant, RestaurantDraft, RestaurantFilter, RestaurantPatch,
    ValidationError,
};

// =============================================================================
// Resource Kind
// =============================================================================

/// The cached collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Restaurants,
    Categories,
    Dishes,
    HeroSlides,
    Favorites,
}

impl ResourceKind {
    /// Name used as the `resource` field in log events.
    pub const fn name(&self) -> &'static str {
        match self {
            ResourceKind::Restaurants => "restaurants",
            ResourceKind::Categories => "categories",
            ResourceKind::Dishes => "dishes",
            ResourceKind::HeroSlides => "hero_slides",
            ResourceKind::Favorites => "favorites",
        }
    }

    /// Session-scoped collections are dropped on logout.
    pub const fn is_session_scoped(&self) -> bool {
        matches!(self, ResourceKind::Favorites)
    }

    /// Collections that change often enough to warrant the shorter TTL.
    pub const fn is_high_churn(&self) -> bool {
        matches!(
            self,
            ResourceKind::Dishes | ResourceKind::HeroSlides | ResourceKind::Favorites
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A server collection element that a [`ResourceStore`](crate::ResourceStore)
/// can cache.
pub trait Resource: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Create input.
    type Draft: Debug + Send + Sync;
    /// Partial update input.
    type Patch: Debug + Send + Sync;
    /// List query. Compared to decide whether a cached list answers a load.
    type Filter: Clone + Debug + PartialEq + Send + Sync;

    const KIND: ResourceKind;

    fn id(&self) -> &str;

    fn validate_draft(_draft: &Self::Draft) -> Result<(), ValidationError> {
        Ok(())
    }

    fn validate_patch(_patch: &Self::Patch) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A resource with a dense `position` inside its owning scope.
pub trait Orderable: Resource {
    /// First position in a scope (0 or 1).
    const POSITION_BASE: i64;

    /// Id of the owning scope.
    fn scope(&self) -> &str;

    fn position(&self) -> i64;

    fn set_position(&mut self, position: i64);
}

// =============================================================================
// Implementations
// =============================================================================

impl Resource for Restaurant {
    type Draft = RestaurantDraft;
    type Patch = RestaurantPatch;
    type Filter = RestaurantFilter;

    const KIND: ResourceKind = ResourceKind::Restaurants;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &RestaurantDraft) -> Result<(), ValidationError> {
        validate_restaurant_draft(draft)
    }

    fn validate_patch(patch: &RestaurantPatch) -> Result<(), ValidationError> {
        validate_restaurant_patch(patch)
    }
}

impl Resource for Category {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;
    type Filter = CategoryFilter;

    const KIND: ResourceKind = ResourceKind::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &CategoryDraft) -> Result<(), ValidationError> {
        validate_category_draft(draft)
    }

    fn validate_patch(patch: &CategoryPatch) -> Result<(), ValidationError> {
        validate_category_patch(patch)
    }
}

impl Resource for Dish {
    type Draft = DishDraft;
    type Patch = DishPatch;
    type Filter = DishFilter;

    const KIND: ResourceKind = ResourceKind::Dishes;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &DishDraft) -> Result<(), ValidationError> {
        validate_dish_draft(draft)
    }

    fn validate_patch(patch: &DishPatch) -> Result<(), ValidationError> {
        validate_dish_patch(patch)
    }
}

impl Orderable for Dish {
    const POSITION_BASE: i64 = 0;

    fn scope(&self) -> &str {
        &self.category_id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl Resource for HeroSlide {
    type Draft = HeroSlideDraft;
    type Patch = HeroSlidePatch;
    type Filter = HeroSlideFilter;

    const KIND: ResourceKind = ResourceKind::HeroSlides;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &HeroSlideDraft) -> Result<(), ValidationError> {
        validate_hero_slide_draft(draft)
    }

    fn validate_patch(patch: &HeroSlidePatch) -> Result<(), ValidationError> {
        validate_hero_slide_patch(patch)
    }
}

impl Orderable for HeroSlide {
    const POSITION_BASE: i64 = 0;

    fn scope(&self) -> &str {
        &self.restaurant_id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

/// Favorites are never patched and always listed for the signed-in user.
impl Resource for Favorite {
    type Draft = FavoriteDraft;
    type Patch = ();
    type Filter = ();

    const KIND: ResourceKind = ResourceKind::Favorites;

    fn id(&self) -> &str {
        &self.id
    }
}
