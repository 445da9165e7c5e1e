//! # Poset Consensus Subsystem
//!
//! **Subsystem ID:** 2
//!
//! Leaderless Byzantine fault-tolerant consensus over a DAG of signed
//! events. Participants gossip events that reference a self-parent (their
//! own previous event) and an optional other-parent; the engine derives a
//! total order of transactions from the DAG alone through virtual voting.
//!
//! ## Pipeline
//!
//! ```text
//! insert_event → divide_rounds → decide_fame → decide_round_received
//!              → process_decided_rounds ──Block──→ [commit channel]
//!              → process_sig_pool (anchor block)
//! ```
//!
//! ## Thresholds
//!
//! For `n` participants a supermajority is `2n/3 + 1` and the trust count is
//! `ceil(n/3)`. Both are recomputed when the participant set publishes a
//! change.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hg_02_poset::{commit_channel, InmemStore, Poset, PosetDependencies};
//!
//! let store = Arc::new(InmemStore::new(participants.clone(), 500));
//! let (commit_tx, mut commit_rx) = commit_channel();
//! let mut poset = Poset::new(PosetDependencies {
//!     participants,
//!     store,
//!     commit_tx: Some(commit_tx),
//! })?;
//!
//! poset.insert_event(event, true)?;
//! poset.run_consensus_pass().await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

/// Deterministic DAG builder for tests.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::InmemStore;
pub use config::{ConfigError, PosetConfig, DEFAULT_CACHE_SIZE};
pub use domain::{
    Block, BlockBody, BlockSignature, Event, EventBody, FlagTable, Frame, InternalTransaction,
    InternalTransactionKind, PosetError, PosetResult, Root, RootEvent, RoundInfo, Thresholds,
    Trilean, WireBody, WireEvent, WireInfo,
};
pub use ports::{PosetApi, Store};
pub use service::{commit_channel, Poset, PosetDependencies};
