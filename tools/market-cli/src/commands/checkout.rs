//! Checkout command.

use anyhow::Result;
use market_commerce::prelude::*;

use super::CheckoutArgs;
use crate::context::Context;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let order = place_order(ctx, &UserId::new(args.user))?;
    print_order(&order, ctx);
    Ok(())
}

/// Check out against the data file, holding the store lock throughout.
fn place_order(ctx: &Context, user: &UserId) -> Result<OrderSummary> {
    let db = ctx.open_db()?;
    let _lock = ctx.lock_db(&db)?;
    let market = ctx.load_market(&db)?;

    // An aborted checkout changes nothing, so only a commit is saved.
    let order = market.checkout(user)?;
    ctx.save_market(&db, &market)?;
    Ok(order)
}

fn print_order(order: &OrderSummary, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(order);
        return;
    }

    ctx.output.success(&format!("Order {} placed", order.order_id));
    let widths = [24, 5, 12];
    for line in &order.lines {
        ctx.output.table_row(
            &[
                &line.product_name,
                &line.quantity.to_string(),
                &line.subtotal.display(),
            ],
            &widths,
        );
    }
    ctx.output.kv("items", &order.item_count.to_string());
    ctx.output.kv("total", &order.total.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use crate::output::Output;
    use std::path::Path;
    use std::sync::Barrier;

    fn context_in(dir: &Path) -> Context {
        Context {
            config: CliConfig::default(),
            config_path: None,
            output: Output::new(false, true),
            cwd: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_concurrent_checkouts_share_the_last_unit() {
        let dir = tempfile::tempdir().unwrap();
        let (alice, bob) = (UserId::new("alice"), UserId::new("bob"));
        let lamp = ProductId::new("9");

        let ctx = context_in(dir.path());
        let db = ctx.open_db().unwrap();
        let market = ctx.load_market(&db).unwrap();
        market
            .list_product(
                Product::with_id(
                    lamp.clone(),
                    UserId::new("seller"),
                    "Desk Lamp",
                    Money::new(2500, Currency::USD),
                    1,
                )
                .unwrap(),
            )
            .unwrap();
        market.add_to_cart(&alice, &lamp, 1).unwrap();
        market.add_to_cart(&bob, &lamp, 1).unwrap();
        ctx.save_market(&db, &market).unwrap();

        // Each buyer runs with its own context, as separate processes would.
        let barrier = Barrier::new(2);
        let outcomes: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = [&alice, &bob]
                .into_iter()
                .map(|user| {
                    let barrier = &barrier;
                    let ctx = context_in(dir.path());
                    s.spawn(move || {
                        barrier.wait();
                        (user.clone(), place_order(&ctx, user))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&UserId> = outcomes
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(user, _)| user)
            .collect();
        assert_eq!(winners.len(), 1);
        let (loser, failure) = outcomes
            .iter()
            .find(|(_, result)| result.is_err())
            .unwrap();
        let failure = failure.as_ref().unwrap_err();
        assert!(matches!(
            failure.downcast_ref::<CommerceError>(),
            Some(CommerceError::InsufficientStock { available: 0, .. })
        ));

        let saved = ctx.load_market(&db).unwrap();
        assert_eq!(saved.stock(&lamp).unwrap(), 0);
        assert!(saved.carts().is_empty(winners[0]));
        assert_eq!(saved.carts().lines(loser).len(), 1);
    }
}
