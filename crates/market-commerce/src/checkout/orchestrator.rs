//! Checkout orchestration.
//!
//! A checkout holds the user's cart and every product in it for its whole
//! duration: validation and commit see the same stock, and the decrements
//! and the cart clear land together or not at all.

use crate::cart::{aggregate, CartStore, CartView};
use crate::catalog::Inventory;
use crate::checkout::{CheckoutFlow, OrderSummary, UnitOfWork};
use crate::error::CommerceError;
use crate::ids::UserId;
use market_observability::CheckoutMetrics;
use tracing::{info, instrument, warn};

/// Runs checkouts against an inventory and a cart store.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutOrchestrator<'a> {
    inventory: &'a Inventory,
    carts: &'a CartStore,
    metrics: &'a CheckoutMetrics,
}

impl<'a> CheckoutOrchestrator<'a> {
    pub fn new(inventory: &'a Inventory, carts: &'a CartStore, metrics: &'a CheckoutMetrics) -> Self {
        Self {
            inventory,
            carts,
            metrics,
        }
    }

    /// Check out `user_id`'s cart.
    ///
    /// On success every line has been decremented from stock and the cart is
    /// empty. On failure neither store has changed; the error is the first
    /// failing line in cart order.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub fn checkout(&self, user_id: &UserId) -> Result<OrderSummary, CommerceError> {
        self.metrics.record_attempt();
        let mut flow = CheckoutFlow::new(user_id.clone());

        match self.run(&mut flow) {
            Ok(summary) => {
                self.metrics
                    .record_committed(summary.item_count, summary.total.amount_cents);
                info!(
                    order_id = %summary.order_id,
                    item_count = summary.item_count,
                    total = %summary.total,
                    "checkout committed"
                );
                Ok(summary)
            }
            Err(err) => {
                self.metrics.record_aborted(err.kind());
                warn!(
                    order_id = %flow.order_id,
                    reason = err.kind(),
                    error = %err,
                    "checkout aborted"
                );
                Err(err)
            }
        }
    }

    fn run(&self, flow: &mut CheckoutFlow) -> Result<OrderSummary, CommerceError> {
        let prepared = UnitOfWork::begin(self.carts, self.inventory, &flow.user_id)
            .and_then(|mut uow| self.validate(&mut uow).map(|view| (uow, view)));

        let (uow, view) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                flow.abort(&err)?;
                return Err(err);
            }
        };
        flow.mark_validated()?;

        uow.commit();
        flow.mark_committed()?;
        Ok(OrderSummary::from_view(flow.order_id.clone(), view))
    }

    /// Stage every line and price the cart from the locked products.
    fn validate(&self, uow: &mut UnitOfWork<'_>) -> Result<CartView, CommerceError> {
        if uow.lines().is_empty() {
            return Err(CommerceError::EmptyCart(uow.user_id().clone()));
        }
        uow.stage_cart()?;

        let txn = uow.inventory();
        let view = aggregate(uow.user_id(), uow.lines(), self.inventory.currency(), |id| {
            txn.product(id).ok()
        })?;
        // Staging already failed for any line without a locked product.
        debug_assert!(view.unavailable.is_empty());
        Ok(view)
    }
}
