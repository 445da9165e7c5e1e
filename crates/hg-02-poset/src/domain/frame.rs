//! Frames: ordered snapshots of one round-received.

use super::event::Event;
use super::root::Root;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Roots are index-aligned with the participant set's id order; events are
/// sorted by lamport timestamp, ties broken by hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub round: i64,
    pub roots: Vec<Root>,
    pub events: Vec<Event>,
}

impl Frame {
    pub fn new(round: i64, roots: Vec<Root>, mut events: Vec<Event>) -> Self {
        events.sort_by(consensus_order);
        Self {
            round,
            roots,
            events,
        }
    }
}

/// Total order of consensus events within a frame.
pub fn consensus_order(a: &Event, b: &Event) -> Ordering {
    a.lamport_timestamp()
        .cmp(&b.lamport_timestamp())
        .then_with(|| a.hash().cmp(b.hash()))
}
