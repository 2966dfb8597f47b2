//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod product;
pub mod simulate;

use clap::{Args, Subcommand};

/// Arguments for the product command.
#[derive(Args)]
pub struct ProductArgs {
    #[command(subcommand)]
    pub command: ProductCommand,
}

#[derive(Subcommand)]
pub enum ProductCommand {
    /// List a new product.
    Add {
        /// Product name.
        name: String,

        /// Unit price as a decimal amount (e.g. 10.00).
        #[arg(short, long)]
        price: f64,

        /// Initial stock.
        #[arg(short, long, default_value = "0")]
        stock: i64,

        /// Seller listing the product.
        #[arg(long, default_value = "seller")]
        seller: String,

        /// Product description.
        #[arg(short, long)]
        description: Option<String>,

        /// Product id (generated when omitted).
        #[arg(long)]
        id: Option<String>,
    },
    /// List products.
    List {
        /// Only products from this seller.
        #[arg(long)]
        seller: Option<String>,
    },
    /// Add stock to a product.
    Restock {
        /// Product id.
        id: String,
        /// Units to add.
        amount: i64,
    },
    /// Overwrite a product's stock level.
    SetStock {
        /// Product id.
        id: String,
        /// New stock level.
        quantity: i64,
    },
    /// Remove a product.
    Delist {
        /// Product id.
        id: String,
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Search products by keyword.
    Search {
        /// Keyword matched against name and description.
        keyword: String,
        /// Only show products in stock.
        #[arg(long)]
        in_stock: bool,
    },
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommand,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Add a product to a user's cart.
    Add {
        /// Buyer.
        #[arg(short, long)]
        user: String,
        /// Product id.
        product: String,
        /// Units to add.
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },
    /// Show a user's cart with totals.
    View {
        /// Buyer.
        #[arg(short, long)]
        user: String,
    },
    /// Set a cart line's quantity (0 removes the line).
    Update {
        /// Cart line id.
        line: String,
        /// New quantity.
        quantity: i64,
    },
    /// Remove a cart line.
    Remove {
        /// Cart line id.
        line: String,
    },
    /// Remove every line from a user's cart.
    Clear {
        /// Buyer.
        #[arg(short, long)]
        user: String,
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Buyer whose cart is checked out.
    #[arg(short, long)]
    pub user: String,
}

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Name of the contested product.
    #[arg(short, long, default_value = "Limited Edition")]
    pub product: String,

    /// Units in stock.
    #[arg(short, long, default_value = "1")]
    pub stock: i64,

    /// Buyers racing for it, each wanting one unit.
    #[arg(short, long, default_value = "2")]
    pub buyers: usize,

    /// Unit price.
    #[arg(long, default_value = "10.0")]
    pub price: f64,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
