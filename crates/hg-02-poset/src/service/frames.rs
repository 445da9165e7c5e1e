//! Frame construction and block commitment.

use super::Poset;
use crate::domain::{Block, Event, Frame, PosetError, PosetResult, Root, RootEvent};
use crate::metrics;
use crate::ports::Store;
use shared_types::{Hash, PublicKey};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

impl<S: Store> Poset<S> {
    /// Snapshot of an event's self-parent.
    pub fn create_self_parent_root_event(&mut self, event: &Event) -> PosetResult<RootEvent> {
        let self_parent = *event.self_parent();
        Ok(RootEvent {
            hash: self_parent,
            creator_id: self.creator_id(event.creator())?,
            index: event.index() - 1,
            lamport_timestamp: self.lamport_timestamp(&self_parent)?,
            round: self.round(&self_parent)?,
        })
    }

    /// Snapshot of an event's other-parent, reusing the creator's root
    /// bridge when there is one.
    pub fn create_other_parent_root_event(
        &mut self,
        event: &Event,
    ) -> PosetResult<Option<RootEvent>> {
        let Some(other_parent) = event.other_parent().copied() else {
            return Ok(None);
        };
        let root = self.store.get_root(event.creator())?;
        if let Some(bridged) = root.others.get(event.hash()).filter(|o| o.hash == other_parent) {
            return Ok(Some(bridged.clone()));
        }
        let (creator_id, index) = match self.store.get_event(&other_parent) {
            Ok(other) => (self.creator_id(other.creator())?, other.index()),
            Err(e) if e.is_key_not_found() => match self.roots_by_self_parent.get(&other_parent) {
                Some(other_root) => (
                    other_root.self_parent.creator_id,
                    other_root.self_parent.index,
                ),
                None => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        };
        Ok(Some(RootEvent {
            hash: other_parent,
            creator_id,
            index,
            lamport_timestamp: self.lamport_timestamp(&other_parent)?,
            round: self.round(&other_parent)?,
        }))
    }

    /// Root from which `event` can be replayed without its ancestry.
    pub fn create_root(&mut self, event: &Event) -> PosetResult<Root> {
        let next_round = self.round(event.hash())?;
        let self_parent = self.create_self_parent_root_event(event)?;
        let mut others = BTreeMap::new();
        if let Some(other) = self.create_other_parent_root_event(event)? {
            others.insert(*event.hash(), other);
        }
        Ok(Root {
            next_round,
            self_parent,
            others,
        })
    }

    /// Root whose self-parent is `event` itself, for participants with no
    /// event in a frame.
    fn create_root_on(&mut self, event: &Event) -> PosetResult<Root> {
        let round = self.round(event.hash())?;
        Ok(Root {
            next_round: round,
            self_parent: RootEvent {
                hash: *event.hash(),
                creator_id: self.creator_id(event.creator())?,
                index: event.index(),
                lamport_timestamp: self.lamport_timestamp(event.hash())?,
                round,
            },
            others: BTreeMap::new(),
        })
    }

    pub fn get_frame(&mut self, round_received: i64) -> PosetResult<Frame> {
        match self.store.get_frame(round_received) {
            Ok(frame) => return Ok(frame),
            Err(e) if e.is_key_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let round_info = self.store.get_round(round_received)?;
        let events = round_info
            .consensus_events()
            .iter()
            .map(|h| self.store.get_event(h))
            .collect::<Result<Vec<_>, _>>()?;
        let mut frame = Frame::new(round_received, Vec::new(), events);

        let mut roots: HashMap<PublicKey, Root> = HashMap::new();
        for event in &frame.events {
            if !roots.contains_key(event.creator()) {
                let root = self.create_root(event)?;
                roots.insert(*event.creator(), root);
            }
        }

        let participants = self.participants.read().pub_keys();
        for key in &participants {
            if roots.contains_key(key) {
                continue;
            }
            let (last, is_root) = self.store.last_consensus_event_from(key)?;
            let root = if is_root {
                self.store.get_root(key)?
            } else {
                let event = self.store.get_event(&last)?;
                self.create_root_on(&event)?
            };
            roots.insert(*key, root);
        }

        // Bridge other-parents that lie outside the frame.
        let mut treated: HashSet<Hash> = HashSet::new();
        for event in &frame.events {
            treated.insert(*event.hash());
            let Some(other_parent) = event.other_parent() else {
                continue;
            };
            if treated.contains(other_parent) {
                continue;
            }
            let root_self_parent = roots
                .get(event.creator())
                .map(|r| r.self_parent.hash)
                .ok_or_else(|| PosetError::InvalidFrame("missing creator root".to_string()))?;
            if *event.self_parent() == root_self_parent {
                continue;
            }
            if let Some(other) = self.create_other_parent_root_event(event)? {
                if let Some(root) = roots.get_mut(event.creator()) {
                    root.others.insert(*event.hash(), other);
                }
            }
        }

        frame.roots = participants
            .iter()
            .filter_map(|key| roots.remove(key))
            .collect();
        self.store.set_frame(frame.clone())?;
        Ok(frame)
    }

    /// Commit decided rounds in queue order, stopping at the first
    /// undecided one.
    pub async fn process_decided_rounds(&mut self) -> PosetResult<()> {
        while let Some(pending) = self.pending_rounds.front().copied() {
            if !pending.decided {
                break;
            }
            if self.last_consensus_round == Some(pending.index) {
                debug!(round = pending.index, "[poset] Round already committed at reset");
                self.pending_rounds.pop_front();
                continue;
            }

            let frame = self.get_frame(pending.index)?;
            let mut block = None;
            if frame.events.is_empty() {
                debug!(round = pending.index, "[poset] No events to commit");
            } else {
                for event in &frame.events {
                    self.store.add_consensus_event(event)?;
                    self.consensus_transactions += event.transactions().len() as u64;
                    if event.is_loaded() {
                        self.pending_loaded_events -= 1;
                    }
                }
                let candidate = Block::from_frame(self.store.last_block_index() + 1, &frame);
                if !candidate.transactions().is_empty() {
                    self.store.set_block(candidate.clone())?;
                    block = Some(candidate);
                }
            }

            self.pending_rounds.pop_front();
            let advances = self
                .last_consensus_round
                .map_or(true, |last| pending.index > last);
            if advances {
                self.set_last_consensus_round(pending.index);
            }

            if let Some(block) = block {
                info!(
                    index = block.index(),
                    round_received = block.round_received(),
                    transactions = block.transactions().len(),
                    "[poset] Committing block"
                );
                metrics::record_block_committed(block.transactions().len());
                if let Some(tx) = &self.commit_tx {
                    tx.send(block)
                        .await
                        .map_err(|_| PosetError::CommitChannelClosed)?;
                }
            }
        }
        Ok(())
    }
}
