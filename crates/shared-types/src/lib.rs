//! # Shared Types Crate
//!
//! Primitive aliases and error contracts shared by the poset subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: hash, key and signature widths are defined once.
//! - **Distinguished lookups**: every store lookup reports a missing key as
//!   [`StoreError::KeyNotFound`], separate from I/O failures, so callers can
//!   branch on it.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
