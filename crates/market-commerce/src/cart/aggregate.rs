//! Read-side cart totals.

use crate::cart::CartLine;
use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::{ProductId, UserId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// A cart line joined with its product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedLine {
    pub line: CartLine,
    pub product_name: String,
    pub unit_price: Money,
    /// unit_price * quantity.
    pub subtotal: Money,
    /// Stock at the time the view was built. Informational only; checkout
    /// re-reads stock.
    pub available: i64,
}

impl PricedLine {
    /// Whether the line currently asks for more than is in stock.
    pub fn exceeds_stock(&self) -> bool {
        self.line.quantity > self.available
    }
}

/// Priced view of a user's cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartView {
    pub user_id: UserId,
    /// Lines whose product still exists.
    pub lines: Vec<PricedLine>,
    /// Lines whose product has been delisted. Excluded from totals.
    pub unavailable: Vec<CartLine>,
    /// Sum of line subtotals. Zero for an empty cart.
    pub total: Money,
    /// Sum of quantities over priced lines.
    pub item_count: i64,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.unavailable.is_empty()
    }

    pub fn has_unavailable(&self) -> bool {
        !self.unavailable.is_empty()
    }

    /// Number of distinct products in the view.
    pub fn unique_item_count(&self) -> usize {
        self.lines.len()
    }
}

/// `price * quantity` for one line.
pub fn line_subtotal(product: &Product, line: &CartLine) -> Result<Money, CommerceError> {
    product
        .price
        .try_multiply(line.quantity)
        .ok_or(CommerceError::Overflow)
}

/// Price `lines` using `lookup` to resolve products.
///
/// Lines whose product can't be resolved are flagged as unavailable rather
/// than failing the whole aggregation.
pub fn aggregate<'p>(
    user_id: &UserId,
    lines: &[CartLine],
    currency: Currency,
    lookup: impl Fn(&ProductId) -> Option<&'p Product>,
) -> Result<CartView, CommerceError> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut unavailable = Vec::new();

    for line in lines {
        let Some(product) = lookup(&line.product_id) else {
            unavailable.push(line.clone());
            continue;
        };
        if product.price.currency != currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: currency.code().to_string(),
                got: product.price.currency.code().to_string(),
            });
        }
        priced.push(PricedLine {
            line: line.clone(),
            product_name: product.name.clone(),
            unit_price: product.price,
            subtotal: line_subtotal(product, line)?,
            available: product.stock_quantity,
        });
    }

    let total =
        Money::try_sum(priced.iter().map(|l| &l.subtotal), currency).ok_or(CommerceError::Overflow)?;
    let item_count = priced
        .iter()
        .try_fold(0_i64, |acc, l| acc.checked_add(l.line.quantity))
        .ok_or(CommerceError::Overflow)?;

    Ok(CartView {
        user_id: user_id.clone(),
        lines: priced,
        unavailable,
        total,
        item_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CartLineId;
    use chrono::Utc;
    use std::collections::HashMap;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product::with_id(
            ProductId::new(id),
            UserId::new("seller"),
            format!("Product {id}"),
            Money::new(price_cents, Currency::USD),
            stock,
        )
        .unwrap()
    }

    fn line(product_id: &str, quantity: i64) -> CartLine {
        CartLine {
            id: CartLineId::generate(),
            user_id: UserId::new("alice"),
            product_id: ProductId::new(product_id),
            quantity,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals() {
        let catalog: HashMap<ProductId, Product> = [product("7", 1000, 5), product("9", 2500, 1)]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let lines = [line("7", 3), line("9", 1)];

        let view = aggregate(&UserId::new("alice"), &lines, Currency::USD, |id| catalog.get(id))
            .unwrap();

        assert_eq!(view.total, Money::new(5500, Currency::USD));
        assert_eq!(view.item_count, 4);
        assert_eq!(view.lines[0].subtotal.amount_cents, 3000);
        assert_eq!(view.lines[1].subtotal.amount_cents, 2500);
        assert!(!view.has_unavailable());
    }

    #[test]
    fn test_empty_cart_totals_zero() {
        let view = aggregate(&UserId::new("alice"), &[], Currency::USD, |_| None).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.total, Money::zero(Currency::USD));
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn test_missing_product_is_flagged_not_fatal() {
        let catalog: HashMap<ProductId, Product> = [product("7", 1000, 5)]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let lines = [line("7", 2), line("gone", 4)];

        let view = aggregate(&UserId::new("alice"), &lines, Currency::USD, |id| catalog.get(id))
            .unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.unavailable.len(), 1);
        assert_eq!(view.unavailable[0].product_id, ProductId::new("gone"));
        assert_eq!(view.total.amount_cents, 2000);
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_exceeds_stock_hint() {
        let catalog: HashMap<ProductId, Product> = [product("9", 2500, 1)]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let lines = [line("9", 2)];
        let view = aggregate(&UserId::new("alice"), &lines, Currency::USD, |id| catalog.get(id))
            .unwrap();
        assert!(view.lines[0].exceeds_stock());
    }
}
