//! Serializable image of a marketplace.

use crate::cart::CartLine;
use crate::catalog::Product;
use crate::money::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything needed to rebuild a [`crate::Marketplace`]: products with
/// their stock, and every open cart line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MarketSnapshot {
    pub currency: Currency,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl MarketSnapshot {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.lines.is_empty()
    }
}
