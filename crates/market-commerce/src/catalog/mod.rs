//! Catalog module.
//!
//! Contains the product record and the inventory ledger that owns stock.

mod inventory;
mod product;

pub use inventory::{Inventory, InventoryTxn};
pub use product::Product;
