//! Cart store: per-user cart lines.

use crate::error::CommerceError;
use crate::ids::{CartLineId, ProductId, UserId};
use chrono::{DateTime, Utc};
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Default maximum quantity allowed per cart line.
pub const MAX_QUANTITY_PER_LINE: i64 = 9999;

/// One product in a user's cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Surrogate id for line-level operations.
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

type LockedCart = ArcMutexGuard<RawMutex, UserCart>;

#[derive(Debug, Default)]
struct UserCart {
    lines: Vec<CartLine>,
    /// Set once the cart has been dropped from the store. Anyone who locked
    /// it after that must look the user up again.
    evicted: bool,
}

impl UserCart {
    fn position_of(&self, line_id: &CartLineId) -> Option<usize> {
        self.lines.iter().position(|l| &l.id == line_id)
    }
}

/// Store of cart lines keyed by user.
///
/// Each user's cart has its own lock. Lines are unique per
/// (user, product): adding a product that is already in the cart grows the
/// existing line. The store never looks at stock.
///
/// A cart exists only while it has lines; emptying it removes the entry.
#[derive(Debug)]
pub struct CartStore {
    max_line_quantity: i64,
    carts: RwLock<HashMap<UserId, Arc<Mutex<UserCart>>>>,
    owners: RwLock<HashMap<CartLineId, UserId>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(MAX_QUANTITY_PER_LINE)
    }
}

impl CartStore {
    pub fn new(max_line_quantity: i64) -> Self {
        Self {
            max_line_quantity,
            carts: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_line_quantity(&self) -> i64 {
        self.max_line_quantity
    }

    fn cart(&self, user_id: &UserId) -> Option<Arc<Mutex<UserCart>>> {
        self.carts.read().get(user_id).cloned()
    }

    fn cart_or_insert(&self, user_id: &UserId) -> Arc<Mutex<UserCart>> {
        if let Some(cart) = self.cart(user_id) {
            return cart;
        }
        self.carts
            .write()
            .entry(user_id.clone())
            .or_default()
            .clone()
    }

    /// Lock the user's live cart, if there is one.
    fn lock_existing(&self, user_id: &UserId) -> Option<LockedCart> {
        loop {
            let guard = self.cart(user_id)?.lock_arc();
            if !guard.evicted {
                return Some(guard);
            }
        }
    }

    /// Lock the user's live cart, creating it if needed.
    fn lock_or_insert(&self, user_id: &UserId) -> LockedCart {
        loop {
            let guard = self.cart_or_insert(user_id).lock_arc();
            if !guard.evicted {
                return guard;
            }
        }
    }

    /// Drop an empty cart from the store. The cart lock must be held; the
    /// map lock is taken after it.
    fn evict_if_empty(&self, user_id: &UserId, cart: &mut LockedCart) {
        if cart.evicted || !cart.lines.is_empty() {
            return;
        }
        let mut carts = self.carts.write();
        if carts
            .get(user_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, ArcMutexGuard::mutex(cart)))
        {
            carts.remove(user_id);
        }
        cart.evicted = true;
    }

    fn check_new_line(&self, quantity: i64) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        self.check_limit(quantity)
    }

    fn check_limit(&self, quantity: i64) -> Result<(), CommerceError> {
        if quantity > self.max_line_quantity {
            return Err(CommerceError::QuantityExceedsLimit {
                quantity,
                limit: self.max_line_quantity,
            });
        }
        Ok(())
    }

    /// Lines in a user's cart, in the order they were added.
    pub fn lines(&self, user_id: &UserId) -> Vec<CartLine> {
        self.cart(user_id)
            .map(|cart| cart.lock().lines.clone())
            .unwrap_or_default()
    }

    /// Whether the user has no lines.
    pub fn is_empty(&self, user_id: &UserId) -> bool {
        self.cart(user_id)
            .map(|cart| cart.lock().lines.is_empty())
            .unwrap_or(true)
    }

    /// Look up a single line.
    pub fn line(&self, line_id: &CartLineId) -> Option<CartLine> {
        let owner = self.owners.read().get(line_id).cloned()?;
        let cart = self.cart(&owner)?;
        let guard = cart.lock();
        guard.position_of(line_id).map(|i| guard.lines[i].clone())
    }

    /// Grow the (user, product) line by `delta`, creating it if needed.
    ///
    /// Fails with `InvalidQuantity` when the resulting quantity would not be
    /// positive; the cart is unchanged in that case.
    pub fn upsert_line(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<CartLine, CommerceError> {
        let mut guard = self.lock_or_insert(user_id);

        if let Some(existing) = guard.lines.iter_mut().find(|l| &l.product_id == product_id) {
            let quantity = existing
                .quantity
                .checked_add(delta)
                .ok_or(CommerceError::Overflow)?;
            if quantity <= 0 {
                return Err(CommerceError::InvalidQuantity(quantity));
            }
            self.check_limit(quantity)?;
            existing.quantity = quantity;
            return Ok(existing.clone());
        }

        if let Err(err) = self.check_new_line(delta) {
            self.evict_if_empty(user_id, &mut guard);
            return Err(err);
        }

        let line = CartLine {
            id: CartLineId::generate(),
            user_id: user_id.clone(),
            product_id: product_id.clone(),
            quantity: delta,
            added_at: Utc::now(),
        };
        guard.lines.push(line.clone());
        self.owners.write().insert(line.id.clone(), user_id.clone());
        Ok(line)
    }

    /// Replace a line's quantity. A quantity of zero or less deletes the line
    /// and returns `None`.
    pub fn set_line_quantity(
        &self,
        line_id: &CartLineId,
        quantity: i64,
    ) -> Result<Option<CartLine>, CommerceError> {
        let not_found = || CommerceError::CartLineNotFound(line_id.clone());
        let owner = self.owners.read().get(line_id).cloned().ok_or_else(not_found)?;
        let mut guard = self.lock_existing(&owner).ok_or_else(not_found)?;
        let index = guard.position_of(line_id).ok_or_else(not_found)?;

        if quantity <= 0 {
            guard.lines.remove(index);
            self.owners.write().remove(line_id);
            self.evict_if_empty(&owner, &mut guard);
            return Ok(None);
        }
        self.check_limit(quantity)?;
        guard.lines[index].quantity = quantity;
        Ok(Some(guard.lines[index].clone()))
    }

    /// Remove a line. Removing a line that does not exist is a no-op.
    /// Returns whether a line was removed.
    pub fn remove_line(&self, line_id: &CartLineId) -> bool {
        let Some(owner) = self.owners.read().get(line_id).cloned() else {
            return false;
        };
        let Some(mut guard) = self.lock_existing(&owner) else {
            return false;
        };
        let Some(index) = guard.position_of(line_id) else {
            return false;
        };
        guard.lines.remove(index);
        self.owners.write().remove(line_id);
        self.evict_if_empty(&owner, &mut guard);
        true
    }

    /// Remove every line for a user. Idempotent; returns the number removed.
    pub fn clear_cart(&self, user_id: &UserId) -> usize {
        let Some(mut guard) = self.lock_existing(user_id) else {
            return 0;
        };
        let removed = self.clear_lines(&mut guard.lines);
        self.evict_if_empty(user_id, &mut guard);
        removed
    }

    fn clear_lines(&self, lines: &mut Vec<CartLine>) -> usize {
        if lines.is_empty() {
            return 0;
        }
        let mut owners = self.owners.write();
        for line in lines.iter() {
            owners.remove(&line.id);
        }
        let removed = lines.len();
        lines.clear();
        removed
    }

    /// Lock a user's cart for the duration of a unit of work.
    ///
    /// Other operations on the same user's cart wait until the guard drops.
    /// Returns `None` when the user has no cart; nothing is created.
    pub fn lock_cart(&self, user_id: &UserId) -> Option<CartGuard<'_>> {
        let cart = self.lock_existing(user_id)?;
        Some(CartGuard {
            store: self,
            user_id: user_id.clone(),
            cart,
        })
    }

    /// Number of users with a non-empty cart.
    pub fn cart_count(&self) -> usize {
        self.carts.read().len()
    }

    /// Every line in the store, grouped by user.
    pub fn all_lines(&self) -> Vec<CartLine> {
        let carts: Vec<_> = self.carts.read().values().cloned().collect();
        let mut lines: Vec<CartLine> = carts
            .iter()
            .flat_map(|cart| cart.lock().lines.clone())
            .collect();
        lines.sort_by(|a, b| {
            a.user_id
                .cmp(&b.user_id)
                .then(a.added_at.cmp(&b.added_at))
        });
        lines
    }

    /// Re-insert a persisted line, keeping its id and timestamp.
    pub fn restore_line(&self, line: CartLine) -> Result<(), CommerceError> {
        self.check_new_line(line.quantity)?;
        let mut guard = self.lock_or_insert(&line.user_id);
        if guard.lines.iter().any(|l| l.product_id == line.product_id) {
            return Err(CommerceError::Snapshot(format!(
                "duplicate cart line for user {} and product {}",
                line.user_id, line.product_id
            )));
        }
        self.owners
            .write()
            .insert(line.id.clone(), line.user_id.clone());
        guard.lines.push(line);
        Ok(())
    }
}

/// Exclusive hold on one user's cart.
pub struct CartGuard<'a> {
    store: &'a CartStore,
    user_id: UserId,
    cart: LockedCart,
}

impl CartGuard<'_> {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.cart.lines
    }

    pub fn is_empty(&self) -> bool {
        self.cart.lines.is_empty()
    }

    /// Remove every line while the cart is held.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.store.clear_lines(&mut self.cart.lines);
        self.store.evict_if_empty(&self.user_id, &mut self.cart);
        removed
    }
}
