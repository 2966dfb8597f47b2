//! Cart commands.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use market_commerce::cart::CartView;
use market_commerce::prelude::*;

use super::{CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let db = ctx.open_db()?;
    let _lock = ctx.lock_db(&db)?;
    let market = ctx.load_market(&db)?;

    let changed = match args.command {
        CartCommand::Add {
            user,
            product,
            quantity,
        } => {
            let line = market.add_to_cart(&UserId::new(user), &ProductId::new(product), quantity)?;
            if ctx.output.is_json() {
                ctx.output.json(&line);
            }
            ctx.output.success(&format!(
                "Cart line {}: {} x {}",
                line.id, line.product_id, line.quantity
            ));
            true
        }
        CartCommand::View { user } => {
            let view = market.view_cart(&UserId::new(user))?;
            print_cart(&view, ctx);
            false
        }
        CartCommand::Update { line, quantity } => {
            match market.update_line_quantity(&CartLineId::new(&line), quantity)? {
                Some(updated) => {
                    if ctx.output.is_json() {
                        ctx.output.json(&updated);
                    }
                    ctx.output
                        .success(&format!("Line {} now holds {}", line, updated.quantity));
                }
                None => {
                    if ctx.output.is_json() {
                        ctx.output
                            .json(&serde_json::json!({ "line_id": line, "removed": true }));
                    }
                    ctx.output.success(&format!("Removed line {}", line));
                }
            }
            true
        }
        CartCommand::Remove { line } => {
            let removed = market.remove_line(&CartLineId::new(&line));
            if ctx.output.is_json() {
                ctx.output
                    .json(&serde_json::json!({ "line_id": line, "removed": removed }));
            }
            if removed {
                ctx.output.success(&format!("Removed line {}", line));
            } else {
                ctx.output.info(&format!("No line {}", line));
            }
            removed
        }
        CartCommand::Clear { user, yes } => {
            let user = UserId::new(user);
            if market.carts().is_empty(&user) {
                ctx.output.info(&format!("Cart for {} is already empty", user));
                false
            } else {
                if !yes {
                    if ctx.output.is_json() {
                        bail!("Refusing to clear without --yes in JSON mode");
                    }
                    let confirmed = Confirm::new()
                        .with_prompt(format!("Clear the cart for {}?", user))
                        .default(false)
                        .interact()?;
                    if !confirmed {
                        ctx.output.info("Cancelled");
                        return Ok(());
                    }
                }
                let removed = market.clear_cart(&user);
                if ctx.output.is_json() {
                    ctx.output
                        .json(&serde_json::json!({ "user_id": user, "removed": removed }));
                }
                ctx.output
                    .success(&format!("Removed {} line(s) from {}'s cart", removed, user));
                true
            }
        }
    };

    if changed {
        ctx.save_market(&db, &market)?;
    }
    Ok(())
}

fn print_cart(view: &CartView, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(view);
        return;
    }

    ctx.output.header(&format!("Cart for {}", view.user_id));
    if view.is_empty() {
        ctx.output.info("Cart is empty");
        return;
    }

    let widths = [34, 24, 5, 12, 12];
    ctx.output
        .table_header(&["LINE", "PRODUCT", "QTY", "UNIT", "SUBTOTAL"], &widths);
    for priced in &view.lines {
        ctx.output.table_row(
            &[
                priced.line.id.as_str(),
                &priced.product_name,
                &priced.line.quantity.to_string(),
                &priced.unit_price.display(),
                &priced.subtotal.display(),
            ],
            &widths,
        );
        if priced.exceeds_stock() {
            ctx.output.warn(&format!(
                "Only {} of {} in stock",
                priced.available, priced.product_name
            ));
        }
    }
    for line in &view.unavailable {
        ctx.output.warn(&format!(
            "Line {} refers to product {} which is no longer listed",
            line.id, line.product_id
        ));
    }

    ctx.output.kv("items", &view.item_count.to_string());
    ctx.output.kv("total", &view.total.display());
}
