//! Marketplace facade.
//!
//! Bundles the inventory ledger, the cart store and the checkout metrics
//! behind the operations a request handler needs. A `Marketplace` is
//! `Send + Sync`; share it across workers with an `Arc`.

use crate::cart::{aggregate, CartLine, CartStore, CartView, MAX_QUANTITY_PER_LINE};
use crate::catalog::{Inventory, Product};
use crate::checkout::{CheckoutOrchestrator, OrderSummary};
use crate::error::CommerceError;
use crate::ids::{CartLineId, ProductId, UserId};
use crate::money::{Currency, Money};
use crate::snapshot::MarketSnapshot;
use chrono::Utc;
use market_observability::CheckoutMetrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Marketplace-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceSettings {
    /// Currency every product is priced in.
    pub currency: Currency,
    /// Largest quantity a single cart line may hold.
    pub max_line_quantity: i64,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            max_line_quantity: MAX_QUANTITY_PER_LINE,
        }
    }
}

/// In-process marketplace.
#[derive(Debug)]
pub struct Marketplace {
    settings: MarketplaceSettings,
    inventory: Inventory,
    carts: CartStore,
    metrics: CheckoutMetrics,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new(MarketplaceSettings::default())
    }
}

impl Marketplace {
    pub fn new(settings: MarketplaceSettings) -> Self {
        Self {
            settings,
            inventory: Inventory::new(settings.currency),
            carts: CartStore::new(settings.max_line_quantity),
            metrics: CheckoutMetrics::new(),
        }
    }

    pub fn settings(&self) -> &MarketplaceSettings {
        &self.settings
    }

    pub fn currency(&self) -> Currency {
        self.settings.currency
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn carts(&self) -> &CartStore {
        &self.carts
    }

    pub fn metrics(&self) -> &CheckoutMetrics {
        &self.metrics
    }

    // --- Catalog ---

    pub fn list_product(&self, product: Product) -> Result<ProductId, CommerceError> {
        self.inventory.list_product(product)
    }

    pub fn delist_product(&self, product_id: &ProductId) -> Option<Product> {
        self.inventory.delist_product(product_id)
    }

    pub fn restock(&self, product_id: &ProductId, amount: i64) -> Result<i64, CommerceError> {
        self.inventory.restock(product_id, amount)
    }

    pub fn set_stock(&self, product_id: &ProductId, quantity: i64) -> Result<(), CommerceError> {
        self.inventory.set_stock(product_id, quantity)
    }

    pub fn product(&self, product_id: &ProductId) -> Option<Product> {
        self.inventory.product(product_id)
    }

    pub fn products(&self) -> Vec<Product> {
        self.inventory.products()
    }

    pub fn products_by_seller(&self, seller_id: &UserId) -> Vec<Product> {
        self.inventory.products_by_seller(seller_id)
    }

    pub fn search(&self, keyword: &str, in_stock_only: bool) -> Vec<Product> {
        self.inventory.search(keyword, in_stock_only)
    }

    pub fn stock(&self, product_id: &ProductId) -> Result<i64, CommerceError> {
        self.inventory.stock(product_id)
    }

    // --- Cart ---

    /// Add `quantity` units of a product to the user's cart.
    ///
    /// The product must exist. Stock is not checked here; checkout does that.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = %product_id, quantity = quantity))]
    pub fn add_to_cart(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<CartLine, CommerceError> {
        if quantity < 1 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if self.inventory.product(product_id).is_none() {
            return Err(CommerceError::ProductNotFound(product_id.clone()));
        }
        let line = self.carts.upsert_line(user_id, product_id, quantity)?;
        debug!(line_id = %line.id, line_quantity = line.quantity, "added to cart");
        Ok(line)
    }

    /// Replace a line's quantity; zero or less removes the line.
    pub fn update_line_quantity(
        &self,
        line_id: &CartLineId,
        quantity: i64,
    ) -> Result<Option<CartLine>, CommerceError> {
        self.carts.set_line_quantity(line_id, quantity)
    }

    pub fn remove_line(&self, line_id: &CartLineId) -> bool {
        self.carts.remove_line(line_id)
    }

    pub fn clear_cart(&self, user_id: &UserId) -> usize {
        self.carts.clear_cart(user_id)
    }

    /// Priced view of the user's cart.
    ///
    /// Each product is read on its own, so the view is not a consistent cut
    /// across products while checkouts run. Use it for display only.
    pub fn view_cart(&self, user_id: &UserId) -> Result<CartView, CommerceError> {
        let lines = self.carts.lines(user_id);
        let products: HashMap<ProductId, Product> = lines
            .iter()
            .filter_map(|line| self.inventory.product(&line.product_id))
            .map(|p| (p.id.clone(), p))
            .collect();
        aggregate(user_id, &lines, self.currency(), |id| products.get(id))
    }

    pub fn item_count(&self, user_id: &UserId) -> Result<i64, CommerceError> {
        Ok(self.view_cart(user_id)?.item_count)
    }

    pub fn cart_total(&self, user_id: &UserId) -> Result<Money, CommerceError> {
        Ok(self.view_cart(user_id)?.total)
    }

    // --- Checkout ---

    pub fn checkout(&self, user_id: &UserId) -> Result<OrderSummary, CommerceError> {
        CheckoutOrchestrator::new(&self.inventory, &self.carts, &self.metrics).checkout(user_id)
    }

    // --- Persistence ---

    /// Capture products and cart lines.
    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            currency: self.currency(),
            products: self.inventory.products(),
            lines: self.carts.all_lines(),
            saved_at: Some(Utc::now()),
        }
    }

    /// Rebuild a marketplace from a snapshot.
    ///
    /// The snapshot must be in the configured currency unless it is empty.
    pub fn restore(
        settings: MarketplaceSettings,
        snapshot: MarketSnapshot,
    ) -> Result<Self, CommerceError> {
        if snapshot.currency != settings.currency && !snapshot.is_empty() {
            return Err(CommerceError::Snapshot(format!(
                "snapshot is priced in {}, marketplace is configured for {}",
                snapshot.currency, settings.currency
            )));
        }
        let market = Self::new(settings);
        for product in snapshot.products {
            market.inventory.list_product(product)?;
        }
        for line in snapshot.lines {
            market.carts.restore_line(line)?;
        }
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn market() -> Marketplace {
        let market = Marketplace::default();
        for (id, name, cents, stock) in [("7", "Notebook", 1000, 5), ("9", "Desk Lamp", 2500, 1)] {
            let product = Product::with_id(
                ProductId::new(id),
                UserId::new("seller"),
                name,
                Money::new(cents, Currency::USD),
                stock,
            )
            .unwrap();
            market.list_product(product).unwrap();
        }
        market
    }

    #[test]
    fn test_marketplace_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Marketplace>();
        assert_send_sync::<Arc<Marketplace>>();
    }

    #[test]
    fn test_add_to_cart_accumulates() {
        let market = market();
        let user = UserId::new("alice");
        let x = ProductId::new("7");
        market.add_to_cart(&user, &x, 2).unwrap();
        let line = market.add_to_cart(&user, &x, 3).unwrap();

        assert_eq!(line.quantity, 5);
        assert_eq!(market.carts().lines(&user).len(), 1);
    }

    #[test]
    fn test_add_to_cart_validation() {
        let market = market();
        let user = UserId::new("alice");
        assert_eq!(
            market.add_to_cart(&user, &ProductId::new("7"), 0).unwrap_err(),
            CommerceError::InvalidQuantity(0)
        );
        assert_eq!(
            market
                .add_to_cart(&user, &ProductId::new("nope"), 1)
                .unwrap_err(),
            CommerceError::ProductNotFound(ProductId::new("nope"))
        );
        // No stock check when adding.
        assert!(market.add_to_cart(&user, &ProductId::new("9"), 40).is_ok());
    }

    #[test]
    fn test_view_cart_totals() {
        let market = market();
        let user = UserId::new("alice");
        market.add_to_cart(&user, &ProductId::new("7"), 3).unwrap();
        market.add_to_cart(&user, &ProductId::new("9"), 1).unwrap();

        let view = market.view_cart(&user).unwrap();
        assert_eq!(view.total.display(), "$55.00");
        assert_eq!(view.item_count, 4);
        assert_eq!(market.item_count(&user).unwrap(), 4);
        assert_eq!(market.cart_total(&user).unwrap().amount_cents, 5500);
    }

    #[test]
    fn test_view_cart_flags_delisted_products() {
        let market = market();
        let user = UserId::new("alice");
        market.add_to_cart(&user, &ProductId::new("7"), 3).unwrap();
        market.add_to_cart(&user, &ProductId::new("9"), 1).unwrap();
        market.delist_product(&ProductId::new("9"));

        let view = market.view_cart(&user).unwrap();
        assert_eq!(view.total.amount_cents, 3000);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.unavailable.len(), 1);
    }

    #[test]
    fn test_update_and_remove_lines() {
        let market = market();
        let user = UserId::new("alice");
        let line = market.add_to_cart(&user, &ProductId::new("7"), 3).unwrap();

        let updated = market.update_line_quantity(&line.id, 1).unwrap().unwrap();
        assert_eq!(updated.quantity, 1);
        assert!(market.update_line_quantity(&line.id, 0).unwrap().is_none());
        assert!(market.carts().is_empty(&user));
        assert!(!market.remove_line(&line.id));
        assert!(market
            .update_line_quantity(&line.id, 2)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_snapshot_restore() {
        let market = market();
        let user = UserId::new("alice");
        market.add_to_cart(&user, &ProductId::new("7"), 3).unwrap();

        let json = serde_json::to_string(&market.snapshot()).unwrap();
        let snapshot: MarketSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Marketplace::restore(MarketplaceSettings::default(), snapshot).unwrap();

        assert_eq!(restored.products().len(), 2);
        assert_eq!(restored.stock(&ProductId::new("9")).unwrap(), 1);
        assert_eq!(restored.carts().lines(&user), market.carts().lines(&user));
        let summary = restored.checkout(&user).unwrap();
        assert_eq!(summary.total.amount_cents, 3000);
    }

    #[test]
    fn test_restore_rejects_currency_mismatch() {
        let snapshot = market().snapshot();
        let settings = MarketplaceSettings {
            currency: Currency::EUR,
            ..MarketplaceSettings::default()
        };
        assert!(matches!(
            Marketplace::restore(settings, snapshot),
            Err(CommerceError::Snapshot(_))
        ));
    }
}
