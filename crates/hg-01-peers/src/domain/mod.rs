//! Participant set domain.

pub mod error;
pub mod peer;
pub mod peers;
