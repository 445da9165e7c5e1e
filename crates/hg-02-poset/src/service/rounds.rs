//! Round, witness and lamport-timestamp assignment.

use super::Poset;
use crate::domain::{Event, FlagTable, PendingRound, PosetResult, RoundInfo};
use crate::ports::Store;
use shared_types::{short_hex, Hash};
use std::collections::HashSet;
use tracing::debug;

impl<S: Store> Poset<S> {
    pub fn round(&mut self, x: &Hash) -> PosetResult<i64> {
        self.sync_participants()?;
        let id = self.caches.id(x);
        if let Some(round) = self.caches.round.get(&id) {
            return Ok(round);
        }
        let round = self.compute_round(x)?;
        self.caches.round.put(id, round);
        Ok(round)
    }

    fn compute_round(&mut self, x: &Hash) -> PosetResult<i64> {
        if let Some(root) = self.roots_by_self_parent.get(x) {
            return Ok(root.self_parent.round);
        }
        let event = self.store.get_event(x)?;
        if let Some(round) = event.round() {
            return Ok(round);
        }
        let root = self.store.get_root(event.creator())?;

        // First event on top of the root, other-parent absent or bridged.
        if event.self_parent() == &root.self_parent.hash
            && event
                .other_parent()
                .map_or(true, |op| root.bridges(x, op))
        {
            return Ok(root.next_round);
        }

        let mut parent_round = self.round(event.self_parent())?;

        if let Some(other_parent) = event.other_parent() {
            let other_round = match root.others.get(x).filter(|o| &o.hash == other_parent) {
                Some(bridged) => bridged.round,
                None => self.round(other_parent)?,
            };
            if other_round > parent_round {
                let witnesses: HashSet<Hash> =
                    self.store.round_witnesses(other_round).into_iter().collect();
                let seen = self.count_seen_witnesses(x, event.flag_table().keys(), &witnesses)?;
                if seen >= self.thresholds.super_majority {
                    return Ok(other_round + 1);
                }
                if seen > 0 {
                    return Ok(other_round);
                }
                parent_round = other_round;
            }
        }

        let witnesses: HashSet<Hash> = self.store.round_witnesses(parent_round).into_iter().collect();
        let super_majority = self.thresholds.super_majority;

        if event.witness_proof().len() >= super_majority {
            let seen = self.count_seen_witnesses(x, event.witness_proof().iter(), &witnesses)?;
            if seen >= super_majority {
                return Ok(parent_round + 1);
            }
        }
        if event.flag_table().len() >= super_majority {
            let seen = self.count_seen_witnesses(x, event.flag_table().keys(), &witnesses)?;
            if seen >= super_majority {
                return Ok(parent_round + 1);
            }
        }
        Ok(parent_round)
    }

    /// Entries of `candidates` that are witnesses in `witnesses` and seen by `x`.
    fn count_seen_witnesses<'a>(
        &mut self,
        x: &Hash,
        candidates: impl Iterator<Item = &'a Hash>,
        witnesses: &HashSet<Hash>,
    ) -> PosetResult<usize> {
        let mut seen = 0;
        for w in candidates {
            if w != x && witnesses.contains(w) && self.see(x, w)? {
                seen += 1;
            }
        }
        Ok(seen)
    }

    /// True iff `x` is the first event of its creator in its round.
    pub fn witness(&mut self, x: &Hash) -> PosetResult<bool> {
        let event = self.store.get_event(x)?;
        Ok(self.round(x)? > self.round(event.self_parent())?)
    }

    pub fn round_diff(&mut self, x: &Hash, y: &Hash) -> PosetResult<i64> {
        Ok(self.round(x)? - self.round(y)?)
    }

    pub fn lamport_timestamp(&mut self, x: &Hash) -> PosetResult<i64> {
        self.sync_participants()?;
        let id = self.caches.id(x);
        if let Some(timestamp) = self.caches.lamport.get(&id) {
            return Ok(timestamp);
        }
        let timestamp = self.compute_lamport_timestamp(x)?;
        self.caches.lamport.put(id, timestamp);
        Ok(timestamp)
    }

    fn compute_lamport_timestamp(&mut self, x: &Hash) -> PosetResult<i64> {
        if let Some(root) = self.roots_by_self_parent.get(x) {
            return Ok(root.self_parent.lamport_timestamp);
        }
        let event = self.store.get_event(x)?;
        if let Some(timestamp) = event.lamport_timestamp() {
            return Ok(timestamp);
        }
        let root = self.store.get_root(event.creator())?;

        let mut parent_timestamp = if event.self_parent() == &root.self_parent.hash {
            root.self_parent.lamport_timestamp
        } else {
            self.lamport_timestamp(event.self_parent())?
        };

        if let Some(other_parent) = event.other_parent() {
            let other_timestamp = match self.store.get_event(other_parent) {
                Ok(_) => Some(self.lamport_timestamp(other_parent)?),
                Err(e) if e.is_key_not_found() => {
                    match root.others.get(x).filter(|o| &o.hash == other_parent) {
                        Some(bridged) => Some(bridged.lamport_timestamp),
                        None => self
                            .roots_by_self_parent
                            .get(other_parent)
                            .map(|r| r.self_parent.lamport_timestamp),
                    }
                }
                Err(e) => return Err(e.into()),
            };
            if let Some(other_timestamp) = other_timestamp {
                parent_timestamp = parent_timestamp.max(other_timestamp);
            }
        }
        Ok(parent_timestamp + 1)
    }

    pub fn lamport_timestamp_diff(&mut self, x: &Hash, y: &Hash) -> PosetResult<i64> {
        Ok(self.lamport_timestamp(y)? - self.lamport_timestamp(x)?)
    }

    /// Assign round and lamport timestamp to every undetermined event that
    /// lacks them, and register it in its round.
    pub fn divide_rounds(&mut self) -> PosetResult<()> {
        self.sync_participants()?;
        let undetermined = self.undetermined_events.clone();

        for hash in &undetermined {
            let mut event = self.store.get_event(hash)?;
            let mut updated = false;

            if event.round().is_none() {
                let round_number = self.round(hash)?;
                event.set_round(round_number);
                updated = true;

                let mut round_info = match self.store.get_round(round_number) {
                    Ok(info) => info,
                    Err(e) if e.is_key_not_found() => RoundInfo::new(),
                    Err(e) => return Err(e.into()),
                };
                let settled = self
                    .last_consensus_round
                    .is_some_and(|last| round_number < last);
                if !round_info.is_queued() && !settled {
                    self.pending_rounds.push_back(PendingRound::new(round_number));
                    round_info.set_queued(true);
                }

                let witness = self.witness(hash)?;
                round_info.add_event(*hash, witness);
                self.store.set_round(round_number, round_info)?;

                if witness && self.is_local_head(&event)? {
                    self.attach_witness_snapshot(&mut event, round_number)?;
                }
                debug!(
                    event = %short_hex(hash),
                    round = round_number,
                    witness,
                    "[poset] Round assigned"
                );
            }

            if event.lamport_timestamp().is_none() {
                let timestamp = self.lamport_timestamp(hash)?;
                event.set_lamport_timestamp(timestamp);
                updated = true;
            }

            if updated {
                if event.wire_info().is_none() {
                    self.set_wire_info(&mut event)?;
                }
                self.store.set_event(event)?;
            }
        }
        Ok(())
    }

    fn is_local_head(&self, event: &Event) -> PosetResult<bool> {
        if self.local_creator.as_ref() != Some(event.creator()) {
            return Ok(false);
        }
        let (head, _) = self.store.last_event_from(event.creator())?;
        Ok(head == *event.hash())
    }

    /// Replace the flag table with the current round's witnesses and the
    /// witness proof with the previous round's (the root for round 0).
    fn attach_witness_snapshot(&mut self, event: &mut Event, round: i64) -> PosetResult<()> {
        let flag_table: FlagTable = self
            .store
            .round_witnesses(round)
            .into_iter()
            .map(|w| (w, 1))
            .collect();
        let proof = if round == 0 {
            vec![self.store.get_root(event.creator())?.self_parent.hash]
        } else {
            self.store.round_witnesses(round - 1)
        };
        event.set_flag_table(flag_table);
        event.set_witness_proof(proof);
        Ok(())
    }
}
