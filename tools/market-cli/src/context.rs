//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use market_commerce::{MarketSnapshot, Marketplace};
use market_db::{Db, DbLock};

use crate::config::CliConfig;
use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["market.toml", ".market.toml", "market.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// File the config was loaded from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, path);
                (CliConfig::load(&path)?, Some(path))
            }
            None => match Self::find_config(&cwd) {
                Some((path, config)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(PathBuf, CliConfig)> {
        start.ancestors().find_map(|dir| {
            CONFIG_NAMES.iter().find_map(|name| {
                let path = dir.join(name);
                if !path.is_file() {
                    return None;
                }
                CliConfig::load(&path).ok().map(|config| (path, config))
            })
        })
    }

    /// Directory relative paths in the config are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(&self.cwd)
    }

    /// Resolved snapshot file path.
    pub fn data_path(&self) -> PathBuf {
        resolve(self.base_dir(), &self.config.store.data_file)
    }

    /// Open the snapshot store.
    pub fn open_db(&self) -> Result<Db> {
        let path = self.data_path();
        self.output
            .debug(&format!("Using data file {}", path.display()));
        Db::open(&path).with_context(|| format!("Failed to open data file: {}", path.display()))
    }

    /// Take the store lock, waiting for any other `market` process to finish.
    ///
    /// Hold the guard from [`Context::load_market`] until after
    /// [`Context::save_market`] so no other writer can slip in between.
    pub fn lock_db(&self, db: &Db) -> Result<DbLock> {
        let lock = db
            .lock()
            .with_context(|| format!("Failed to lock data file: {}", db.path().display()))?;
        self.output
            .debug(&format!("Holding {}", lock.path().display()));
        Ok(lock)
    }

    /// Load the marketplace from the snapshot store, or start an empty one.
    pub fn load_market(&self, db: &Db) -> Result<Marketplace> {
        let settings = self.config.settings();
        match db.load_as::<MarketSnapshot>()? {
            Some(snapshot) => Marketplace::restore(settings, snapshot)
                .with_context(|| format!("Failed to restore {}", db.path().display())),
            None => Ok(Marketplace::new(settings)),
        }
    }

    /// Persist the marketplace.
    pub fn save_market(&self, db: &Db, market: &Marketplace) -> Result<()> {
        db.save(&market.snapshot())
            .with_context(|| format!("Failed to save {}", db.path().display()))
    }
}

/// Resolve a path relative to `base`.
fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
