//! Market CLI - Operate a local marketplace from the command line.
//!
//! Commands:
//! - `market product` - List, restock and search products
//! - `market cart` - Manage buyers' carts
//! - `market checkout` - Check out a buyer's cart
//! - `market simulate` - Race concurrent buyers for limited stock
//! - `market config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use market_observability::{logging, LogLevel};

use commands::{CartArgs, CheckoutArgs, ConfigArgs, ProductArgs, SimulateArgs};

/// Market CLI - Products, carts and checkout for a local marketplace
#[derive(Parser)]
#[command(name = "market")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products and stock
    Product(ProductArgs),

    /// Manage a buyer's cart
    Cart(CartArgs),

    /// Check out a buyer's cart
    Checkout(CheckoutArgs),

    /// Run concurrent checkouts against limited stock
    Simulate(SimulateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let mut log_config = ctx.config.logging.clone();
    if cli.verbose {
        log_config.level = log_config.level.min(LogLevel::Debug);
    }
    logging::init(&log_config);

    // Execute command
    let result = match cli.command {
        Commands::Product(args) => commands::product::run(args, &ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
