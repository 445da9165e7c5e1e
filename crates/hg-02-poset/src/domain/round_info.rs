//! Per-round bookkeeping: witnesses, their fame, and consensus events.

use serde::{Deserialize, Serialize};
use shared_types::Hash;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trilean {
    #[default]
    Undefined,
    True,
    False,
}

impl From<bool> for Trilean {
    fn from(value: bool) -> Self {
        if value {
            Trilean::True
        } else {
            Trilean::False
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEvent {
    pub witness: bool,
    pub famous: Trilean,
    /// Round-received of the event equals this round.
    pub consensus: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInfo {
    events: BTreeMap<Hash, RoundEvent>,
    queued: bool,
}

impl RoundInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event in this round; a second registration is ignored.
    pub fn add_event(&mut self, hash: Hash, witness: bool) {
        self.events.entry(hash).or_insert(RoundEvent {
            witness,
            ..RoundEvent::default()
        });
    }

    pub fn set_consensus_event(&mut self, hash: Hash) {
        self.events.entry(hash).or_default().consensus = true;
    }

    pub fn set_fame(&mut self, hash: &Hash, famous: bool) {
        let entry = self.events.entry(*hash).or_default();
        entry.witness = true;
        entry.famous = famous.into();
    }

    /// True when every witness of the round has a decided fame.
    pub fn witnesses_decided(&self) -> bool {
        self.events
            .values()
            .filter(|e| e.witness)
            .all(|e| e.famous != Trilean::Undefined)
    }

    pub fn is_decided(&self, hash: &Hash) -> bool {
        self.events
            .get(hash)
            .is_some_and(|e| e.witness && e.famous != Trilean::Undefined)
    }

    pub fn witnesses(&self) -> Vec<Hash> {
        self.events
            .iter()
            .filter(|(_, e)| e.witness)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn famous_witnesses(&self) -> Vec<Hash> {
        self.events
            .iter()
            .filter(|(_, e)| e.witness && e.famous == Trilean::True)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn consensus_events(&self) -> Vec<Hash> {
        self.events
            .iter()
            .filter(|(_, e)| e.consensus)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn fame(&self, hash: &Hash) -> Option<Trilean> {
        self.events.get(hash).filter(|e| e.witness).map(|e| e.famous)
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    pub fn set_queued(&mut self, queued: bool) {
        self.queued = queued;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Entry of the pending-rounds queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRound {
    pub index: i64,
    pub decided: bool,
}

impl PendingRound {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            decided: false,
        }
    }
}
