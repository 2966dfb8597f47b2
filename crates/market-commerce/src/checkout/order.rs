//! Order summary returned by a committed checkout.

use crate::cart::CartView;
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One purchased line, priced at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Summary of a committed checkout.
///
/// Computed from the cart as it stood when validation passed, not from a
/// re-read after commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    /// Total units purchased.
    pub item_count: i64,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

impl OrderSummary {
    /// Build the summary from a priced cart view.
    pub fn from_view(order_id: OrderId, view: CartView) -> Self {
        let lines = view
            .lines
            .into_iter()
            .map(|priced| OrderLine {
                product_id: priced.line.product_id,
                product_name: priced.product_name,
                quantity: priced.line.quantity,
                unit_price: priced.unit_price,
                subtotal: priced.subtotal,
            })
            .collect();
        Self {
            order_id,
            user_id: view.user_id,
            lines,
            item_count: view.item_count,
            total: view.total,
            placed_at: Utc::now(),
        }
    }

    /// Number of distinct products purchased.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
