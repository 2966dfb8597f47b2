//! Concurrent checkout simulation.
//!
//! Runs against a throwaway in-memory marketplace; the data file is not
//! touched.

use std::sync::Arc;

use anyhow::{bail, ensure, Result};
use market_commerce::prelude::*;
use serde::Serialize;

use super::SimulateArgs;
use crate::context::Context;
use crate::output::stock_badge;

#[derive(Debug, Serialize)]
struct SimulationReport {
    product: String,
    initial_stock: i64,
    buyers: usize,
    committed: usize,
    rejected: usize,
    final_stock: i64,
    revenue: Money,
    metrics: market_observability::CheckoutMetricsSnapshot,
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    ensure!(args.buyers > 0, "--buyers must be at least 1");
    ensure!(args.stock >= 0, "--stock must not be negative");

    let market = Arc::new(Marketplace::new(ctx.config.settings()));
    let product = Product::new(
        UserId::new("simulation"),
        args.product.clone(),
        Money::from_decimal(args.price, market.currency()),
        args.stock,
    )?;
    let product_id = market.list_product(product)?;

    let buyers: Vec<UserId> = (1..=args.buyers)
        .map(|i| UserId::new(format!("buyer-{i}")))
        .collect();
    for buyer in &buyers {
        market.add_to_cart(buyer, &product_id, 1)?;
    }

    ctx.output.header(&format!(
        "{} buyers racing for {} unit(s) of {}",
        args.buyers, args.stock, args.product
    ));
    let pb = ctx.output.progress(args.buyers as u64, "checking out");

    let handles: Vec<_> = buyers
        .into_iter()
        .map(|buyer| {
            let market = Arc::clone(&market);
            tokio::task::spawn_blocking(move || {
                let result = market.checkout(&buyer);
                (buyer, result)
            })
        })
        .collect();

    let mut committed = 0;
    let mut rejected = 0;
    for handle in handles {
        let (buyer, result) = handle.await?;
        match result {
            Ok(order) => {
                committed += 1;
                ctx.output
                    .debug(&format!("{} bought {} ({})", buyer, order.item_count, order.total));
            }
            Err(CommerceError::InsufficientStock { available, .. }) => {
                rejected += 1;
                ctx.output
                    .debug(&format!("{} rejected, {} available", buyer, available));
            }
            Err(other) => bail!("Unexpected checkout failure for {}: {}", buyer, other),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let final_stock = market.stock(&product_id)?;
    let metrics = market.metrics().snapshot();
    let report = SimulationReport {
        product: args.product,
        initial_stock: args.stock,
        buyers: args.buyers,
        committed,
        rejected,
        final_stock,
        revenue: Money::new(metrics.revenue_minor, market.currency()),
        metrics,
    };

    ensure!(
        report.final_stock >= 0 && report.committed as i64 == args.stock.min(args.buyers as i64),
        "Oversold: {} committed against {} in stock",
        report.committed,
        args.stock
    );

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }
    ctx.output.kv("committed", &report.committed.to_string());
    ctx.output.kv("rejected", &report.rejected.to_string());
    ctx.output.kv("final stock", &stock_badge(report.final_stock));
    ctx.output.kv("revenue", &report.revenue.display());
    ctx.output.success("No overselling");
    Ok(())
}
