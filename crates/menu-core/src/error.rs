//! # Error Types
//!
//! Domain-specific error types for menu-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  menu-core errors (this file)                                          │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  └── ValidationError  - Pre-flight form checks                         │
//! │                                                                         │
//! │  menu-store errors (separate crate)                                    │
//! │  ├── RemoteError      - What the injected REST client reports          │
//! │  └── StoreError       - What store callers see                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → UI error field       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and domain rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Line quantity exceeds the per-line maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart already holds the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// A line carries quantity zero, so its per-unit rate is undefined.
    ///
    /// ## When This Occurs
    /// Only with a hand-edited or corrupt persisted snapshot: every normal
    /// path keeps `quantity >= 1`. Scaling `total / 0` would be a guess, so
    /// the update is refused and the cart left untouched.
    #[error("Cart line {id} has zero quantity; cannot scale its price")]
    ZeroQuantityEntry { id: String },

    /// No cart line matches the given dish id (and options key).
    #[error("Item not in cart: {id}")]
    ItemNotInCart { id: String },

    /// No promotion line matches the given promotion id.
    #[error("Promotion not in cart: {promotion_id}")]
    PromotionNotInCart { promotion_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any request leaves the client, so they never touch
/// store loading flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad slug, bad URL).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
