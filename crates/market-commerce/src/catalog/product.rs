//! Product records held by the inventory.

use crate::error::CommerceError;
use crate::ids::{ProductId, UserId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product listed by a seller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Seller who listed the product.
    pub seller_id: UserId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: Option<String>,
    /// Unit price. Never negative.
    pub price: Money,
    /// Units available for sale. Never negative.
    pub stock_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a product with a generated id.
    pub fn new(
        seller_id: UserId,
        name: impl Into<String>,
        price: Money,
        stock_quantity: i64,
    ) -> Result<Self, CommerceError> {
        Self::with_id(ProductId::generate(), seller_id, name, price, stock_quantity)
    }

    /// Create a product with a caller-chosen id.
    pub fn with_id(
        id: ProductId,
        seller_id: UserId,
        name: impl Into<String>,
        price: Money,
        stock_quantity: i64,
    ) -> Result<Self, CommerceError> {
        if price.is_negative() {
            return Err(CommerceError::InvalidPrice(price.amount_cents));
        }
        if stock_quantity < 0 {
            return Err(CommerceError::InvalidQuantity(stock_quantity));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            seller_id,
            name: name.into(),
            description: None,
            price,
            stock_quantity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Case-insensitive match on name or description.
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&keyword)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&keyword))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn lamp() -> Product {
        Product::with_id(
            ProductId::new("9"),
            UserId::new("seller"),
            "Desk Lamp",
            Money::new(2500, Currency::USD),
            1,
        )
        .unwrap()
        .with_description("Adjustable LED reading lamp")
    }

    #[test]
    fn test_rejects_negative_price() {
        let result = Product::new(
            UserId::new("seller"),
            "Broken",
            Money::new(-1, Currency::USD),
            1,
        );
        assert_eq!(result.unwrap_err(), CommerceError::InvalidPrice(-1));
    }

    #[test]
    fn test_rejects_negative_stock() {
        let result = Product::new(UserId::new("seller"), "Broken", Money::zero(Currency::USD), -3);
        assert_eq!(result.unwrap_err(), CommerceError::InvalidQuantity(-3));
    }

    #[test]
    fn test_keyword_matching() {
        let product = lamp();
        assert!(product.matches("lamp"));
        assert!(product.matches("  LED "));
        assert!(product.matches(""));
        assert!(!product.matches("chair"));
    }
}
