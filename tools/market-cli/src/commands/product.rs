//! Catalog administration commands.

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use market_commerce::prelude::*;

use super::{ProductArgs, ProductCommand};
use crate::context::Context;
use crate::output::stock_badge;

/// Run the product command.
pub async fn run(args: ProductArgs, ctx: &Context) -> Result<()> {
    let db = ctx.open_db()?;
    let _lock = ctx.lock_db(&db)?;
    let market = ctx.load_market(&db)?;

    let changed = match args.command {
        ProductCommand::Add {
            name,
            price,
            stock,
            seller,
            description,
            id,
        } => {
            let price = Money::from_decimal(price, market.currency());
            let seller = UserId::new(seller);
            let id = id.map(ProductId::new).unwrap_or_else(ProductId::generate);
            let mut product = Product::with_id(id, seller, name, price, stock)?;
            if let Some(description) = description {
                product = product.with_description(description);
            }
            let id = market.list_product(product)?;
            let product = market
                .product(&id)
                .context("Product vanished after listing")?;
            if ctx.output.is_json() {
                ctx.output.json(&product);
            }
            ctx.output.success(&format!(
                "Listed {} ({}) at {}, {}",
                product.name,
                product.id,
                product.price,
                stock_badge(product.stock_quantity)
            ));
            true
        }
        ProductCommand::List { seller } => {
            let products = match seller {
                Some(seller) => market.products_by_seller(&UserId::new(seller)),
                None => market.products(),
            };
            print_products(&products, ctx);
            false
        }
        ProductCommand::Restock { id, amount } => {
            let stock = market.restock(&ProductId::new(&id), amount)?;
            if ctx.output.is_json() {
                ctx.output
                    .json(&serde_json::json!({ "product_id": id, "stock": stock }));
            }
            ctx.output
                .success(&format!("Restocked {}: {}", id, stock_badge(stock)));
            true
        }
        ProductCommand::SetStock { id, quantity } => {
            market.set_stock(&ProductId::new(&id), quantity)?;
            if ctx.output.is_json() {
                ctx.output
                    .json(&serde_json::json!({ "product_id": id, "stock": quantity }));
            }
            ctx.output
                .success(&format!("Set stock of {}: {}", id, stock_badge(quantity)));
            true
        }
        ProductCommand::Delist { id, yes } => {
            let product_id = ProductId::new(&id);
            let Some(product) = market.product(&product_id) else {
                bail!("Product not found: {}", id);
            };
            if !yes && !ctx.output.is_json() {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delist {} ({})?", product.name, product.id))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    ctx.output.info("Cancelled");
                    return Ok(());
                }
            }
            market.delist_product(&product_id);
            if ctx.output.is_json() {
                ctx.output.json(&product);
            }
            ctx.output.success(&format!("Delisted {}", product.name));
            true
        }
        ProductCommand::Search { keyword, in_stock } => {
            let products = market.search(&keyword, in_stock);
            print_products(&products, ctx);
            false
        }
    };

    if changed {
        ctx.save_market(&db, &market)?;
    }
    Ok(())
}

fn print_products(products: &[Product], ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&products);
        return;
    }
    if products.is_empty() {
        ctx.output.info("No products");
        return;
    }

    let widths = [34, 24, 12, 16];
    ctx.output.header("Products");
    ctx.output.table_header(&["ID", "NAME", "PRICE", "STOCK"], &widths);
    for product in products {
        ctx.output.table_row(
            &[
                product.id.as_str(),
                &product.name,
                &product.price.display(),
                &stock_badge(product.stock_quantity),
            ],
            &widths,
        );
    }
}
