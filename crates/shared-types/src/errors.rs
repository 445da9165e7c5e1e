//! # Error Types
//!
//! Store errors shared by the store port and its adapters.

use std::fmt;
use thiserror::Error;

/// Record families held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Event,
    Round,
    Root,
    Frame,
    Block,
    ParticipantEvent,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreKind::Event => "Event",
            StoreKind::Round => "Round",
            StoreKind::Root => "Root",
            StoreKind::Frame => "Frame",
            StoreKind::Block => "Block",
            StoreKind::ParticipantEvent => "ParticipantEvent",
        };
        f.write_str(name)
    }
}

/// Errors returned by store lookups and writes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The requested record does not exist. Recoverable: callers fall back
    /// to checkpoint roots.
    #[error("{kind} not found: {key}")]
    KeyNotFound { kind: StoreKind, key: String },

    /// Backend failure. Not recoverable within a pipeline pass.
    #[error("Store I/O error: {0}")]
    Io(String),
}

impl StoreError {
    pub fn not_found(kind: StoreKind, key: impl fmt::Display) -> Self {
        StoreError::KeyNotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn is_key_not_found(&self) -> bool {
        matches!(self, StoreError::KeyNotFound { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
