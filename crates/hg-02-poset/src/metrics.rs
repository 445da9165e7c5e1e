//! # Poset Metrics
//!
//! Prometheus metrics for monitoring consensus progress.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hg-02-poset = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `poset_events_inserted_total` - Counter of accepted events
//! - `poset_events_rejected_total` - Counter of rejected events (by reason)
//! - `poset_blocks_committed_total` - Counter of blocks emitted
//! - `poset_consensus_transactions_total` - Counter of committed transactions
//! - `poset_last_consensus_round` - Gauge of the last processed round
//! - `poset_anchor_block` - Gauge of the anchor block index

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total events accepted by insert
    pub static ref EVENTS_INSERTED: IntCounter = register_int_counter!(
        "poset_events_inserted_total",
        "Total number of events inserted into the poset"
    )
    .expect("Failed to create EVENTS_INSERTED metric");

    /// Total events rejected, labeled by reason
    pub static ref EVENTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "poset_events_rejected_total",
        "Total number of events rejected at insertion",
        &["reason"]
    )
    .expect("Failed to create EVENTS_REJECTED metric");

    /// Total blocks emitted on the commit channel
    pub static ref BLOCKS_COMMITTED: IntCounter = register_int_counter!(
        "poset_blocks_committed_total",
        "Total number of blocks committed"
    )
    .expect("Failed to create BLOCKS_COMMITTED metric");

    /// Total transactions in committed frames
    pub static ref CONSENSUS_TRANSACTIONS: IntCounter = register_int_counter!(
        "poset_consensus_transactions_total",
        "Total number of transactions reaching consensus"
    )
    .expect("Failed to create CONSENSUS_TRANSACTIONS metric");

    /// Last processed round
    pub static ref LAST_CONSENSUS_ROUND: IntGauge = register_int_gauge!(
        "poset_last_consensus_round",
        "Last round whose frame was processed"
    )
    .expect("Failed to create LAST_CONSENSUS_ROUND metric");

    /// Anchor block index
    pub static ref ANCHOR_BLOCK: IntGauge = register_int_gauge!(
        "poset_anchor_block",
        "Index of the most recent sufficiently signed block"
    )
    .expect("Failed to create ANCHOR_BLOCK metric");
}

#[cfg(feature = "metrics")]
pub fn record_event_inserted() {
    EVENTS_INSERTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_event_rejected(reason: &str) {
    EVENTS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_committed(transactions: usize) {
    BLOCKS_COMMITTED.inc();
    CONSENSUS_TRANSACTIONS.inc_by(transactions as u64);
}

#[cfg(feature = "metrics")]
pub fn set_last_consensus_round(round: i64) {
    LAST_CONSENSUS_ROUND.set(round);
}

#[cfg(feature = "metrics")]
pub fn set_anchor_block(index: i64) {
    ANCHOR_BLOCK.set(index);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_event_inserted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_committed(_transactions: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_last_consensus_round(_round: i64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_anchor_block(_index: i64) {}
