//! # Integration Flows
//!
//! Each flow drives one or more complete posets through the public API and
//! checks that independent nodes agree on the committed blocks.

pub mod checkpoint;
pub mod consensus_flow;
pub mod wire_gossip;
