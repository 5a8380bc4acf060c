//! # Validation Module
//!
//! Pre-flight checks run before a create/update request is sent.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (UI)                                                    │
//! │  └── Immediate field feedback                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Store operation (menu-store)                                 │
//! │  └── THIS MODULE: rejects bad drafts/patches with no network call     │
//! │      and without touching any loading flag                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Server                                                       │
//! │  └── Authoritative; failures come back as RemoteRejection              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use menu_core::validation::{validate_name, validate_price};
//! use menu_core::Money;
//!
//! assert!(validate_name("name", "Cheeseburger", 120).is_ok());
//! assert!(validate_price("price", Money::from_cents(-1)).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    CategoryDraft, CategoryPatch, DishDraft, DishOption, DishPatch, HeroSlideDraft,
    HeroSlidePatch, RestaurantDraft, RestaurantPatch,
};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of restaurant and dish names.
pub const MAX_NAME_LEN: usize = 120;

/// Maximum length of category names.
pub const MAX_CATEGORY_NAME_LEN: usize = 80;

/// Maximum length of restaurant slugs.
pub const MAX_SLUG_LEN: usize = 60;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required display name (trimmed, non-empty, bounded).
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a restaurant slug: lowercase letters, digits and single hyphens.
///
/// ```rust
/// use menu_core::validation::validate_slug;
///
/// assert!(validate_slug("tacos-el-guero").is_ok());
/// assert!(validate_slug("Tacos El Guero").is_err());
/// assert!(validate_slug("-tacos").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: MAX_SLUG_LEN,
        });
    }

    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_edges = !slug.starts_with('-') && !slug.ends_with('-') && !slug.contains("--");

    if !valid_chars || !valid_edges {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "use lowercase letters, digits and single hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a price: `0 <= cents <= MAX_PRICE_CENTS`. Zero is allowed
/// (complimentary items).
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.cents() < 0 || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a required http(s) URL.
pub fn validate_url(field: &str, url: &str) -> ValidationResult<()> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }

    Ok(())
}

/// Validates a cart line quantity: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

fn validate_options(options: &[DishOption]) -> ValidationResult<()> {
    for option in options {
        validate_name("option group", &option.group, MAX_NAME_LEN)?;
        validate_name("option name", &option.name, MAX_NAME_LEN)?;
        validate_price("option price", option.price)?;
    }
    Ok(())
}

// =============================================================================
// Resource Validators
// =============================================================================

pub fn validate_restaurant_draft(draft: &RestaurantDraft) -> ValidationResult<()> {
    validate_name("name", &draft.name, MAX_NAME_LEN)?;
    validate_slug(&draft.slug)?;
    if let Some(ref logo) = draft.logo_url {
        validate_url("logo_url", logo)?;
    }
    Ok(())
}

pub fn validate_restaurant_patch(patch: &RestaurantPatch) -> ValidationResult<()> {
    if let Some(ref name) = patch.name {
        validate_name("name", name, MAX_NAME_LEN)?;
    }
    if let Some(ref slug) = patch.slug {
        validate_slug(slug)?;
    }
    if let Some(ref logo) = patch.logo_url {
        validate_url("logo_url", logo)?;
    }
    Ok(())
}

pub fn validate_category_draft(draft: &CategoryDraft) -> ValidationResult<()> {
    if draft.restaurant_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "restaurant_id".to_string(),
        });
    }
    validate_name("name", &draft.name, MAX_CATEGORY_NAME_LEN)
}

pub fn validate_category_patch(patch: &CategoryPatch) -> ValidationResult<()> {
    match patch.name {
        Some(ref name) => validate_name("name", name, MAX_CATEGORY_NAME_LEN),
        None => Ok(()),
    }
}

/// Validates a new dish.
///
/// ## Rules
/// - name required, at most 120 characters
/// - category required
/// - price and every option surcharge within `0..=MAX_PRICE_CENTS`
pub fn validate_dish_draft(draft: &DishDraft) -> ValidationResult<()> {
    validate_name("name", &draft.name, MAX_NAME_LEN)?;
    if draft.category_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "category_id".to_string(),
        });
    }
    validate_price("price", draft.price)?;
    validate_options(&draft.options)
}

pub fn validate_dish_patch(patch: &DishPatch) -> ValidationResult<()> {
    if let Some(ref name) = patch.name {
        validate_name("name", name, MAX_NAME_LEN)?;
    }
    if let Some(price) = patch.price {
        validate_price("price", price)?;
    }
    if let Some(ref options) = patch.options {
        validate_options(options)?;
    }
    Ok(())
}

pub fn validate_hero_slide_draft(draft: &HeroSlideDraft) -> ValidationResult<()> {
    validate_name("title", &draft.title, MAX_NAME_LEN)?;
    validate_url("image_url", &draft.image_url)
}

pub fn validate_hero_slide_patch(patch: &HeroSlidePatch) -> ValidationResult<()> {
    if let Some(ref title) = patch.title {
        validate_name("title", title, MAX_NAME_LEN)?;
    }
    if let Some(ref image) = patch.image_url {
        validate_url("image_url", image)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
