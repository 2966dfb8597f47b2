//! Cart and checkout core for a multi-seller marketplace.
//!
//! This crate owns the parts of the marketplace with real invariants:
//!
//! - **Catalog**: Products and the inventory ledger. Stock never goes below
//!   zero; every decrement is checked under the product's lock.
//! - **Cart**: Per-user cart lines, unique per (user, product), and the
//!   read-side aggregator for subtotals, totals and item counts.
//! - **Checkout**: An all-or-nothing unit of work that validates every line
//!   against current stock, decrements it and clears the cart.
//!
//! # Example
//!
//! ```
//! use market_commerce::prelude::*;
//!
//! let market = Marketplace::default();
//! let lamp = Product::new(UserId::new("seller"), "Desk Lamp", Money::new(2500, Currency::USD), 1)?;
//! let lamp_id = market.list_product(lamp)?;
//!
//! let buyer = UserId::new("alice");
//! market.add_to_cart(&buyer, &lamp_id, 1)?;
//! let order = market.checkout(&buyer)?;
//!
//! assert_eq!(order.total.display(), "$25.00");
//! assert_eq!(market.stock(&lamp_id)?, 0);
//! # Ok::<(), CommerceError>(())
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;

mod marketplace;
mod snapshot;

pub use error::CommerceError;
pub use ids::*;
pub use marketplace::{Marketplace, MarketplaceSettings};
pub use money::{Currency, Money};
pub use snapshot::MarketSnapshot;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::{MarketSnapshot, Marketplace, MarketplaceSettings};

    // Catalog
    pub use crate::catalog::{Inventory, InventoryTxn, Product};

    // Cart
    pub use crate::cart::{CartLine, CartStore, CartView, PricedLine};

    // Checkout
    pub use crate::checkout::{CheckoutFlow, CheckoutState, OrderLine, OrderSummary};
}
