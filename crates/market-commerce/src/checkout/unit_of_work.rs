//! Checkout unit of work.

use crate::cart::{CartGuard, CartLine, CartStore};
use crate::catalog::{Inventory, InventoryTxn};
use crate::error::CommerceError;
use crate::ids::{ProductId, UserId};

/// What a commit applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Remaining stock for every decremented product.
    pub remaining: Vec<(ProductId, i64)>,
    /// Number of cart lines cleared.
    pub cleared_lines: usize,
}

/// Holds a user's cart and every product in it for one checkout.
///
/// The cart lock is taken first, then product locks in id order. Stock
/// decrements are staged and only applied by [`UnitOfWork::commit`], which
/// also clears the cart before any lock is released. Dropping the unit
/// without committing leaves both stores untouched.
pub struct UnitOfWork<'a> {
    cart: CartGuard<'a>,
    inventory: InventoryTxn,
}

impl<'a> UnitOfWork<'a> {
    /// Lock the user's cart and its products.
    ///
    /// Fails with `EmptyCart` when the user has no cart.
    pub fn begin(
        carts: &'a CartStore,
        inventory: &Inventory,
        user_id: &UserId,
    ) -> Result<Self, CommerceError> {
        let cart = carts
            .lock_cart(user_id)
            .ok_or_else(|| CommerceError::EmptyCart(user_id.clone()))?;
        let inventory = inventory.begin(cart.lines().iter().map(|l| &l.product_id));
        Ok(Self { cart, inventory })
    }

    pub fn user_id(&self) -> &UserId {
        self.cart.user_id()
    }

    /// Cart lines as held by this unit.
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Locked inventory view.
    pub fn inventory(&self) -> &InventoryTxn {
        &self.inventory
    }

    /// Stage a decrement. See [`InventoryTxn::decrement`].
    pub fn decrement(&mut self, product_id: &ProductId, amount: i64) -> Result<i64, CommerceError> {
        self.inventory.decrement(product_id, amount)
    }

    /// Stage a decrement for every cart line, in cart order.
    ///
    /// Stops at the first line that cannot be satisfied and returns its
    /// error. Nothing is applied either way until commit.
    pub fn stage_cart(&mut self) -> Result<(), CommerceError> {
        for line in self.cart.lines() {
            self.inventory.decrement(&line.product_id, line.quantity)?;
        }
        Ok(())
    }

    /// Apply staged decrements and clear the cart.
    pub fn commit(self) -> Applied {
        let Self {
            mut cart,
            inventory,
        } = self;
        let remaining = inventory.commit();
        let cleared_lines = cart.clear();
        Applied {
            remaining,
            cleared_lines,
        }
    }

    /// Discard everything staged and release the locks.
    pub fn rollback(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::money::{Currency, Money};

    fn setup() -> (Inventory, CartStore, UserId) {
        let inventory = Inventory::new(Currency::USD);
        for (id, stock) in [("7", 5), ("9", 1)] {
            let product = Product::with_id(
                ProductId::new(id),
                UserId::new("seller"),
                format!("Product {id}"),
                Money::new(1000, Currency::USD),
                stock,
            )
            .unwrap();
            inventory.list_product(product).unwrap();
        }
        let carts = CartStore::default();
        let user = UserId::new("alice");
        carts.upsert_line(&user, &ProductId::new("7"), 3).unwrap();
        carts.upsert_line(&user, &ProductId::new("9"), 1).unwrap();
        (inventory, carts, user)
    }

    #[test]
    fn test_commit_decrements_and_clears() {
        let (inventory, carts, user) = setup();
        let mut uow = UnitOfWork::begin(&carts, &inventory, &user).unwrap();
        uow.stage_cart().unwrap();
        assert_eq!(uow.inventory().staged_units(), 4);
        let applied = uow.commit();

        assert_eq!(applied.cleared_lines, 2);
        assert_eq!(applied.remaining.len(), 2);
        assert_eq!(inventory.stock(&ProductId::new("7")).unwrap(), 2);
        assert_eq!(inventory.stock(&ProductId::new("9")).unwrap(), 0);
        assert!(carts.is_empty(&user));
        assert_eq!(carts.cart_count(), 0);
    }

    #[test]
    fn test_begin_without_cart_is_empty_cart() {
        let (inventory, carts, _) = setup();
        let stranger = UserId::new("stranger");
        assert!(matches!(
            UnitOfWork::begin(&carts, &inventory, &stranger),
            Err(CommerceError::EmptyCart(ref user)) if user == &stranger
        ));
        assert_eq!(carts.cart_count(), 1);
    }

    #[test]
    fn test_drop_without_commit_changes_nothing() {
        let (inventory, carts, user) = setup();
        {
            let mut uow = UnitOfWork::begin(&carts, &inventory, &user).unwrap();
            uow.decrement(&ProductId::new("7"), 3).unwrap();
        }
        assert_eq!(inventory.stock(&ProductId::new("7")).unwrap(), 5);
        assert_eq!(carts.lines(&user).len(), 2);
    }

    #[test]
    fn test_stage_cart_reports_first_short_line() {
        let (inventory, carts, user) = setup();
        inventory.set_stock(&ProductId::new("9"), 0).unwrap();
        let mut uow = UnitOfWork::begin(&carts, &inventory, &user).unwrap();
        let err = uow.stage_cart().unwrap_err();
        assert!(matches!(
            err,
            CommerceError::InsufficientStock { ref product_id, requested: 1, available: 0, .. }
                if product_id == &ProductId::new("9")
        ));
        drop(uow);
        assert_eq!(inventory.stock(&ProductId::new("7")).unwrap(), 5);
    }

    #[test]
    fn test_rollback_after_partial_staging() {
        let (inventory, carts, user) = setup();
        let mut uow = UnitOfWork::begin(&carts, &inventory, &user).unwrap();
        uow.decrement(&ProductId::new("7"), 3).unwrap();
        assert!(uow.decrement(&ProductId::new("9"), 2).is_err());
        uow.rollback();

        assert_eq!(inventory.stock(&ProductId::new("7")).unwrap(), 5);
        assert_eq!(inventory.stock(&ProductId::new("9")).unwrap(), 1);
        assert_eq!(carts.lines(&user).len(), 2);
    }
}
