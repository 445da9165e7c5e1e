//! Error types for the poset engine

use super::cache::CacheError;
use shared_crypto::CryptoError;
use shared_types::StoreError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PosetError {
    #[error("Invalid signature on event {0}")]
    InvalidSignature(String),

    #[error("Self-parent mismatch (fork) for creator {creator}: head is {expected}, event references {actual}")]
    SelfParentMismatch {
        creator: String,
        expected: String,
        actual: String,
    },

    #[error("Unknown other-parent {other_parent} referenced by event {event}")]
    UnknownOtherParent { event: String, other_parent: String },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Insufficient block signatures: got {got}, need {need}")]
    InsufficientSignatures { got: usize, need: usize },

    #[error("No anchor block")]
    NoAnchorBlock,

    #[error("No undetermined events")]
    NoUndeterminedEvents,

    #[error("Malformed wire event: {0}")]
    MalformedWireEvent(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Cache allocation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Commit channel closed")]
    CommitChannelClosed,
}

impl PosetError {
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, PosetError::Store(e) if e.is_key_not_found())
    }
}

pub type PosetResult<T> = Result<T, PosetError>;
