//! Domain layer for the poset engine
//!
//! Pure data types and their invariants. Nothing here touches the store or
//! the participant set; the service layer wires them together.

mod block;
mod cache;
mod error;
mod event;
mod frame;
mod root;
mod round_info;
mod thresholds;
mod wire;

pub use block::*;
pub use cache::*;
pub use error::*;
pub use event::*;
pub use frame::*;
pub use root::*;
pub use round_info::*;
pub use thresholds::*;
pub use wire::*;
