//! Roots: per-participant checkpoint anchors.
//!
//! A root stands in for everything a participant did before local history
//! begins. Its self-parent is the event the participant's next event must
//! build on; `others` bridges other-parents that lie before the checkpoint.

use super::event::root_self_parent;
use hg_01_peers::PeerId;
use serde::{Deserialize, Serialize};
use shared_types::Hash;
use std::collections::BTreeMap;

/// Snapshot of an event that predates local history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootEvent {
    pub hash: Hash,
    pub creator_id: PeerId,
    pub index: i64,
    pub lamport_timestamp: i64,
    pub round: i64,
}

impl RootEvent {
    /// The synthetic self-parent a participant's first ever event points at.
    pub fn base(creator_id: PeerId) -> Self {
        Self {
            hash: root_self_parent(creator_id),
            creator_id,
            index: -1,
            lamport_timestamp: -1,
            round: -1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    /// Round proposed for the creator's first event on top of this root.
    pub next_round: i64,
    pub self_parent: RootEvent,
    /// Bridging event hash → the other-parent it references.
    pub others: BTreeMap<Hash, RootEvent>,
}

impl Root {
    pub fn base(creator_id: PeerId) -> Self {
        Self {
            next_round: 0,
            self_parent: RootEvent::base(creator_id),
            others: BTreeMap::new(),
        }
    }

    /// True when `event`'s other-parent `other_parent` is bridged by this root.
    pub fn bridges(&self, event: &Hash, other_parent: &Hash) -> bool {
        self.others
            .get(event)
            .is_some_and(|other| &other.hash == other_parent)
    }
}
