//! CLI configuration.

use std::path::Path;

use anyhow::{Context, Result};
use market_commerce::cart::MAX_QUANTITY_PER_LINE;
use market_commerce::{Currency, MarketplaceSettings};
use market_observability::LogConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where the marketplace is persisted.
    #[serde(default)]
    pub store: StoreConfig,

    /// Marketplace rules.
    #[serde(default)]
    pub market: MarketConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LogConfig,
}

impl CliConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Marketplace settings derived from the `[market]` section.
    pub fn settings(&self) -> MarketplaceSettings {
        MarketplaceSettings {
            currency: self.market.currency,
            max_line_quantity: self.market.max_line_quantity,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file, relative to the config file's directory (or the
    /// working directory when no config file was found).
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_data_file() -> String {
    ".market/marketplace.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

/// Marketplace rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Currency every product is priced in.
    #[serde(default)]
    pub currency: Currency,

    /// Largest quantity a single cart line may hold.
    #[serde(default = "default_max_line_quantity")]
    pub max_line_quantity: i64,
}

fn default_max_line_quantity() -> i64 {
    MAX_QUANTITY_PER_LINE
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            max_line_quantity: default_max_line_quantity(),
        }
    }
}

/// Generate a default market.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# Marketplace configuration

[store]
data_file = "{data_file}"

[market]
currency = "USD"
max_line_quantity = {max_line_quantity}

[logging]
# trace | debug | info | warn | error (RUST_LOG overrides)
level = "warn"
# human | json
format = "human"
"#,
        data_file = default_data_file(),
        max_line_quantity = MAX_QUANTITY_PER_LINE,
    )
}
