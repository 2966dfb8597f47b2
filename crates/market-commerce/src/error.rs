//! Commerce error types.

use crate::ids::{CartLineId, ProductId, UserId};
use thiserror::Error;

/// Errors raised by the inventory, cart store and checkout.
///
/// The business outcomes (not found, bad quantity, empty cart, short stock)
/// are recoverable by the caller, see [`CommerceError::is_recoverable`].
/// `Overflow` and `Snapshot` are not. No variant leaves partially applied
/// state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// Product not found (never listed, or delisted).
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Cart line not found.
    #[error("Cart line not found: {0}")]
    CartLineNotFound(CartLineId),

    /// Non-positive or malformed quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Line quantity would exceed the per-line cap.
    #[error("Quantity {quantity} exceeds maximum allowed ({limit})")]
    QuantityExceedsLimit { quantity: i64, limit: i64 },

    /// Checkout attempted on a cart with no lines.
    #[error("Cart is empty for user {0}")]
    EmptyCart(UserId),

    /// Not enough stock to satisfy a line.
    #[error(
        "Insufficient stock for {product_name} ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: i64,
        available: i64,
    },

    /// Negative price.
    #[error("Invalid price: {0}")]
    InvalidPrice(i64),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Illegal checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// A persisted snapshot could not be restored.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl CommerceError {
    /// Whether this is a missing product or cart line.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommerceError::ProductNotFound(_) | CommerceError::CartLineNotFound(_)
        )
    }

    /// Whether the caller can act on the error and try again.
    ///
    /// Only arithmetic overflow and snapshot corruption need operator
    /// attention; every other variant is a normal business outcome.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CommerceError::Overflow | CommerceError::Snapshot(_))
    }

    /// Short machine-readable kind, used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CommerceError::ProductNotFound(_) | CommerceError::CartLineNotFound(_) => "not_found",
            CommerceError::InvalidQuantity(_) | CommerceError::QuantityExceedsLimit { .. } => {
                "invalid_quantity"
            }
            CommerceError::EmptyCart(_) => "empty_cart",
            CommerceError::InsufficientStock { .. } => "insufficient_stock",
            CommerceError::InvalidPrice(_) => "invalid_price",
            CommerceError::CurrencyMismatch { .. } => "currency_mismatch",
            CommerceError::InvalidCheckoutTransition { .. } => "invalid_transition",
            CommerceError::Overflow => "overflow",
            CommerceError::Snapshot(_) => "snapshot",
        }
    }
}
