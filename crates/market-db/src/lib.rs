//! JSON snapshot store for the marketplace.
//!
//! Persists one typed document per file with atomic replace-on-write.
//!
//! # Example
//!
//! ```rust,ignore
//! use market_db::Db;
//! use market_commerce::MarketSnapshot;
//!
//! let db = Db::open(".market/marketplace.json")?;
//! let _lock = db.lock()?;
//! let snapshot: MarketSnapshot = db.load_as()?.unwrap_or_default();
//! // ... mutate ...
//! db.save(&snapshot)?;
//! ```

mod db;
mod error;

pub use db::{Db, DbLock};
pub use error::DbError;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Db, DbError, DbLock};
}
