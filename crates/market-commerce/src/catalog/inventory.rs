//! Inventory ledger: the single source of truth for stock counts.
//!
//! Every product row sits behind its own mutex. A stock decrement checks and
//! subtracts while holding that row's lock, so two callers racing on the same
//! product can never both observe the last unit. Checkout takes the locks of
//! every product in the cart up front (in id order, so concurrent checkouts
//! cannot deadlock) and keeps them until it commits or rolls back.

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::{ProductId, UserId};
use crate::money::Currency;
use chrono::Utc;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A product row. `delisted` is set under the row lock when the product is
/// removed so holders of a stale `Arc` see the removal.
#[derive(Debug)]
struct StockRow {
    product: Product,
    delisted: bool,
}

type RowGuard = ArcMutexGuard<RawMutex, StockRow>;

/// In-process inventory ledger with per-product locking.
#[derive(Debug)]
pub struct Inventory {
    currency: Currency,
    rows: RwLock<HashMap<ProductId, Arc<Mutex<StockRow>>>>,
}

impl Inventory {
    /// Create an empty inventory pricing everything in `currency`.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    fn row(&self, id: &ProductId) -> Result<Arc<Mutex<StockRow>>, CommerceError> {
        self.rows
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CommerceError::ProductNotFound(id.clone()))
    }

    /// Whether `row` is still the one the map holds for `id`.
    fn is_current(&self, id: &ProductId, row: &Arc<Mutex<StockRow>>) -> bool {
        self.rows
            .read()
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, row))
    }

    /// Run `f` against a live row while holding its lock.
    fn with_row<T>(
        &self,
        id: &ProductId,
        f: impl FnOnce(&mut StockRow) -> Result<T, CommerceError>,
    ) -> Result<T, CommerceError> {
        let row = self.row(id)?;
        let mut guard = row.lock();
        if guard.delisted {
            return Err(CommerceError::ProductNotFound(id.clone()));
        }
        f(&mut guard)
    }

    // --- Catalog administration ---

    /// List a product, replacing any existing listing with the same id.
    pub fn list_product(&self, product: Product) -> Result<ProductId, CommerceError> {
        if product.price.currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: product.price.currency.code().to_string(),
            });
        }
        if product.price.is_negative() {
            return Err(CommerceError::InvalidPrice(product.price.amount_cents));
        }
        if product.stock_quantity < 0 {
            return Err(CommerceError::InvalidQuantity(product.stock_quantity));
        }

        let id = product.id.clone();
        loop {
            let existing = self.rows.read().get(&id).cloned();
            let Some(row) = existing else {
                if let Entry::Vacant(slot) = self.rows.write().entry(id.clone()) {
                    slot.insert(Arc::new(Mutex::new(StockRow {
                        product,
                        delisted: false,
                    })));
                    break;
                }
                continue;
            };
            let mut guard = row.lock();
            // A delist may have unlinked the row before we locked it.
            if self.is_current(&id, &row) {
                guard.product = product;
                break;
            }
        }
        debug!(product_id = %id, "product listed");
        Ok(id)
    }

    /// Remove a product. Returns the removed record, `None` if absent.
    pub fn delist_product(&self, id: &ProductId) -> Option<Product> {
        let row = self.rows.write().remove(id)?;
        let mut guard = row.lock();
        guard.delisted = true;
        debug!(product_id = %id, "product delisted");
        Some(guard.product.clone())
    }

    /// Add `amount` units of stock. Returns the new stock level.
    pub fn restock(&self, id: &ProductId, amount: i64) -> Result<i64, CommerceError> {
        if amount <= 0 {
            return Err(CommerceError::InvalidQuantity(amount));
        }
        self.with_row(id, |row| {
            let stock = row
                .product
                .stock_quantity
                .checked_add(amount)
                .ok_or(CommerceError::Overflow)?;
            row.product.stock_quantity = stock;
            row.product.updated_at = Utc::now();
            Ok(stock)
        })
    }

    /// Overwrite the stock level (administrative correction).
    pub fn set_stock(&self, id: &ProductId, quantity: i64) -> Result<(), CommerceError> {
        if quantity < 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        self.with_row(id, |row| {
            row.product.stock_quantity = quantity;
            row.product.updated_at = Utc::now();
            Ok(())
        })
    }

    /// Look up a product.
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.with_row(id, |row| Ok(row.product.clone())).ok()
    }

    /// All listed products, oldest first.
    pub fn products(&self) -> Vec<Product> {
        let rows: Vec<_> = self.rows.read().values().cloned().collect();
        let mut products: Vec<Product> = rows
            .iter()
            .filter_map(|row| {
                let guard = row.lock();
                (!guard.delisted).then(|| guard.product.clone())
            })
            .collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        products
    }

    /// Products listed by one seller.
    pub fn products_by_seller(&self, seller_id: &UserId) -> Vec<Product> {
        self.products()
            .into_iter()
            .filter(|p| &p.seller_id == seller_id)
            .collect()
    }

    /// Case-insensitive keyword search over name and description.
    pub fn search(&self, keyword: &str, in_stock_only: bool) -> Vec<Product> {
        self.products()
            .into_iter()
            .filter(|p| p.matches(keyword))
            .filter(|p| !in_stock_only || p.is_in_stock())
            .collect()
    }

    // --- Ledger ---

    /// Current available stock.
    pub fn stock(&self, id: &ProductId) -> Result<i64, CommerceError> {
        self.with_row(id, |row| Ok(row.product.stock_quantity))
    }

    /// Atomically subtract `amount` from a product's stock.
    ///
    /// The availability check and the subtraction happen under the same row
    /// lock. Returns the remaining stock.
    pub fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<i64, CommerceError> {
        self.with_row(id, |row| {
            let remaining = checked_decrement(&row.product, row.product.stock_quantity, amount)?;
            row.product.stock_quantity = remaining;
            row.product.updated_at = Utc::now();
            debug!(product_id = %id, amount, remaining, "stock decremented");
            Ok(remaining)
        })
    }

    /// Begin an inventory transaction over `ids`.
    ///
    /// Locks are taken in ascending id order and held until the transaction
    /// is committed or dropped. Ids that are not listed are simply not
    /// locked; reading them through the transaction yields `ProductNotFound`.
    pub fn begin<'a>(&self, ids: impl IntoIterator<Item = &'a ProductId>) -> InventoryTxn {
        let ordered: BTreeSet<&ProductId> = ids.into_iter().collect();
        let mut rows = BTreeMap::new();
        for id in ordered {
            let Ok(row) = self.row(id) else {
                continue;
            };
            let guard = row.lock_arc();
            if !guard.delisted {
                rows.insert(id.clone(), guard);
            }
        }
        InventoryTxn {
            rows,
            staged: BTreeMap::new(),
        }
    }
}

/// Stock left after taking `amount` from `available`, or the reason it can't be taken.
fn checked_decrement(product: &Product, available: i64, amount: i64) -> Result<i64, CommerceError> {
    if amount <= 0 {
        return Err(CommerceError::InvalidQuantity(amount));
    }
    if amount > available {
        return Err(CommerceError::InsufficientStock {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            requested: amount,
            available,
        });
    }
    Ok(available - amount)
}

/// Locked view of a set of products with staged decrements.
///
/// Nothing is written to the ledger until [`InventoryTxn::commit`]. Dropping
/// the transaction discards staged decrements and releases the locks.
pub struct InventoryTxn {
    rows: BTreeMap<ProductId, RowGuard>,
    staged: BTreeMap<ProductId, i64>,
}

impl InventoryTxn {
    /// The locked product record.
    pub fn product(&self, id: &ProductId) -> Result<&Product, CommerceError> {
        self.rows
            .get(id)
            .map(|row| &row.product)
            .ok_or_else(|| CommerceError::ProductNotFound(id.clone()))
    }

    /// Stock as this transaction sees it (ledger value minus staged decrements).
    pub fn stock(&self, id: &ProductId) -> Result<i64, CommerceError> {
        let product = self.product(id)?;
        let staged = self.staged.get(id).copied().unwrap_or(0);
        Ok(product.stock_quantity - staged)
    }

    /// Stage a conditional decrement. Fails without staging anything if the
    /// product does not have `amount` units left in this transaction.
    pub fn decrement(&mut self, id: &ProductId, amount: i64) -> Result<i64, CommerceError> {
        let available = self.stock(id)?;
        let remaining = checked_decrement(self.product(id)?, available, amount)?;
        *self.staged.entry(id.clone()).or_insert(0) += amount;
        Ok(remaining)
    }

    /// Total units staged for decrement.
    pub fn staged_units(&self) -> i64 {
        self.staged.values().sum()
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Apply staged decrements and release the locks.
    ///
    /// Returns the remaining stock per decremented product.
    pub fn commit(mut self) -> Vec<(ProductId, i64)> {
        let now = Utc::now();
        let staged = std::mem::take(&mut self.staged);
        let mut remaining = Vec::with_capacity(staged.len());
        for (id, amount) in staged {
            if let Some(row) = self.rows.get_mut(&id) {
                row.product.stock_quantity -= amount;
                row.product.updated_at = now;
                debug_assert!(row.product.stock_quantity >= 0);
                debug!(product_id = %id, amount, remaining = row.product.stock_quantity, "stock decremented");
                remaining.push((id, row.product.stock_quantity));
            }
        }
        remaining
    }

    /// Discard staged decrements and release the locks.
    pub fn rollback(self) {
        drop(self);
    }
}

impl Drop for InventoryTxn {
    fn drop(&mut self) {
        if self.has_staged() {
            debug!(units = self.staged_units(), "inventory transaction rolled back");
        }
    }
}
