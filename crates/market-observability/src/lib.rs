//! Observability for the marketplace.
//!
//! This crate provides:
//! - `logging::init` - Installs the process-wide `tracing` subscriber
//! - `CheckoutMetrics` - Lock-free checkout counters with serializable snapshots

pub mod logging;
mod metrics;

pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::*;
