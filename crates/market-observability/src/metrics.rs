//! Checkout counters.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide checkout counters.
///
/// All counters are relaxed atomics; a snapshot is not a consistent cut
/// across counters while checkouts are in flight.
#[derive(Debug, Default)]
pub struct CheckoutMetrics {
    attempts: AtomicU64,
    committed: AtomicU64,
    aborted_empty_cart: AtomicU64,
    aborted_insufficient_stock: AtomicU64,
    aborted_not_found: AtomicU64,
    aborted_other: AtomicU64,
    units_sold: AtomicI64,
    revenue_minor: AtomicI64,
}

impl CheckoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed checkout of `units` items for `revenue_minor`
    /// (currency minor units).
    pub fn record_committed(&self, units: i64, revenue_minor: i64) {
        self.committed.fetch_add(1, Ordering::Relaxed);
        self.units_sold.fetch_add(units, Ordering::Relaxed);
        self.revenue_minor.fetch_add(revenue_minor, Ordering::Relaxed);
    }

    /// Record an aborted checkout by error kind.
    pub fn record_aborted(&self, reason: &str) {
        let counter = match reason {
            "empty_cart" => &self.aborted_empty_cart,
            "insufficient_stock" => &self.aborted_insufficient_stock,
            "not_found" => &self.aborted_not_found,
            _ => &self.aborted_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CheckoutMetricsSnapshot {
        CheckoutMetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            aborted: AbortCounts {
                empty_cart: self.aborted_empty_cart.load(Ordering::Relaxed),
                insufficient_stock: self.aborted_insufficient_stock.load(Ordering::Relaxed),
                not_found: self.aborted_not_found.load(Ordering::Relaxed),
                other: self.aborted_other.load(Ordering::Relaxed),
            },
            units_sold: self.units_sold.load(Ordering::Relaxed),
            revenue_minor: self.revenue_minor.load(Ordering::Relaxed),
        }
    }
}

/// Aborted checkouts by reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AbortCounts {
    pub empty_cart: u64,
    pub insufficient_stock: u64,
    pub not_found: u64,
    pub other: u64,
}

impl AbortCounts {
    pub fn total(&self) -> u64 {
        self.empty_cart + self.insufficient_stock + self.not_found + self.other
    }
}

/// Point-in-time copy of [`CheckoutMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CheckoutMetricsSnapshot {
    pub attempts: u64,
    pub committed: u64,
    pub aborted: AbortCounts,
    pub units_sold: i64,
    /// Revenue in currency minor units.
    pub revenue_minor: i64,
}

impl CheckoutMetricsSnapshot {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as a one-line summary.
    pub fn to_summary(&self) -> String {
        format!(
            "attempts={} committed={} aborted={} (empty_cart={} insufficient_stock={} not_found={}) units_sold={}",
            self.attempts,
            self.committed,
            self.aborted.total(),
            self.aborted.empty_cart,
            self.aborted.insufficient_stock,
            self.aborted.not_found,
            self.units_sold,
        )
    }
}
