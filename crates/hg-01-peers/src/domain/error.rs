//! Participant set errors.

use super::peer::PeerId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PeersError {
    #[error("Duplicate peer id: {0}")]
    DuplicateId(PeerId),

    #[error("Duplicate peer key: {0}")]
    DuplicateKey(String),
}

pub type PeersResult<T> = Result<T, PeersError>;
