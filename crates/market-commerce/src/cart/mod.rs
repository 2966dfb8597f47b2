//! Cart lines and cart totals.

mod aggregate;
mod store;

pub use aggregate::{aggregate, line_subtotal, CartView, PricedLine};
pub use store::{CartGuard, CartLine, CartStore, MAX_QUANTITY_PER_LINE};
