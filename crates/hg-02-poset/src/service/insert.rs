//! Event insertion and wire conversion.

use super::Poset;
use crate::domain::{Event, EventBody, PosetError, PosetResult, Root, WireEvent, WireInfo};
use crate::metrics;
use crate::ports::Store;
use hg_01_peers::PeerId;
use shared_types::{short_hex, Hash, PublicKey};
use tracing::{debug, warn};

impl<S: Store> Poset<S> {
    /// Validate `event` and append it to the DAG.
    ///
    /// Checks, in order: signature, self-parent is the creator's head,
    /// other-parent is resolvable. A rejected event leaves every queue
    /// untouched.
    pub fn insert_event(&mut self, mut event: Event, set_wire_info: bool) -> PosetResult<()> {
        self.sync_participants()?;

        if let Err(e) = self.validate_event(&event) {
            let reason = match &e {
                PosetError::InvalidSignature(_) => "invalid_signature",
                PosetError::SelfParentMismatch { .. } => "self_parent_mismatch",
                PosetError::UnknownOtherParent { .. } => "unknown_other_parent",
                PosetError::UnknownParticipant(_) => "unknown_participant",
                _ => "other",
            };
            warn!(event = %short_hex(event.hash()), reason, "[poset] Event rejected");
            metrics::record_event_rejected(reason);
            return Err(e);
        }

        event.set_topological_index(self.topological_index);
        self.topological_index += 1;

        if set_wire_info {
            self.set_wire_info(&mut event)?;
        }

        let hash = *event.hash();
        let loaded = event.is_loaded();
        let block_signatures = event.block_signatures().to_vec();
        debug!(
            event = %short_hex(&hash),
            creator = %short_hex(event.creator()),
            index = event.index(),
            "[poset] Inserting event"
        );

        self.store.set_event(event)?;
        self.undetermined_events.push(hash);
        if loaded {
            self.pending_loaded_events += 1;
        }
        self.sig_pool.extend(block_signatures);
        metrics::record_event_inserted();
        Ok(())
    }

    fn validate_event(&self, event: &Event) -> PosetResult<()> {
        match event.verify() {
            Ok(true) => {}
            Ok(false) => return Err(PosetError::InvalidSignature(short_hex(event.hash()))),
            Err(e) => {
                return Err(PosetError::InvalidSignature(format!(
                    "{}: {}",
                    short_hex(event.hash()),
                    e
                )))
            }
        }
        self.check_self_parent(event)?;
        self.check_other_parent(event)
    }

    fn check_self_parent(&self, event: &Event) -> PosetResult<()> {
        let creator = event.creator();
        if !self.participants.read().contains_pub_key(creator) {
            return Err(PosetError::UnknownParticipant(short_hex(creator)));
        }
        let (head, _) = self.store.last_event_from(creator)?;
        if event.self_parent() != &head {
            return Err(PosetError::SelfParentMismatch {
                creator: short_hex(creator),
                expected: short_hex(&head),
                actual: short_hex(event.self_parent()),
            });
        }
        Ok(())
    }

    fn check_other_parent(&self, event: &Event) -> PosetResult<()> {
        let Some(other_parent) = event.other_parent() else {
            return Ok(());
        };
        match self.store.get_event(other_parent) {
            Ok(_) => return Ok(()),
            Err(e) if e.is_key_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        if self.roots_by_self_parent.contains_key(other_parent) {
            return Ok(());
        }
        let root = self.store.get_root(event.creator())?;
        if root.bridges(event.hash(), other_parent) {
            return Ok(());
        }
        Err(PosetError::UnknownOtherParent {
            event: short_hex(event.hash()),
            other_parent: short_hex(other_parent),
        })
    }

    /// Express the event's parents as (creator id, index) pairs.
    pub(crate) fn set_wire_info(&self, event: &mut Event) -> PosetResult<()> {
        let creator_id = self.creator_id(event.creator())?;
        let root = self.store.get_root(event.creator())?;

        let self_parent_index = if event.self_parent() == &root.self_parent.hash {
            root.self_parent.index
        } else {
            self.store.get_event(event.self_parent())?.index()
        };

        let (other_parent_creator_id, other_parent_index) = match event.other_parent() {
            None => (None, None),
            Some(op) => {
                let (id, index) = self.locate_other_parent(event.hash(), op, &root)?;
                (Some(id), Some(index))
            }
        };

        event.set_wire_info(WireInfo {
            creator_id,
            self_parent_index,
            other_parent_creator_id,
            other_parent_index,
        });
        Ok(())
    }

    fn locate_other_parent(
        &self,
        event: &Hash,
        other_parent: &Hash,
        root: &Root,
    ) -> PosetResult<(PeerId, i64)> {
        if let Some(bridged) = root.others.get(event).filter(|o| &o.hash == other_parent) {
            return Ok((bridged.creator_id, bridged.index));
        }
        if let Some(other_root) = self.roots_by_self_parent.get(other_parent) {
            return Ok((
                other_root.self_parent.creator_id,
                other_root.self_parent.index,
            ));
        }
        let other = self.store.get_event(other_parent)?;
        Ok((self.creator_id(other.creator())?, other.index()))
    }

    /// Rebuild a hash-linked event from its wire form.
    pub fn read_wire_info(&self, wire: &WireEvent) -> PosetResult<Event> {
        if wire.flag_table.is_empty() {
            return Err(PosetError::MalformedWireEvent(
                "flag table is empty".to_string(),
            ));
        }
        let creator = self.creator_key(wire.body.creator_id)?;
        let self_parent = self
            .store
            .participant_event(&creator, wire.body.self_parent_index)?;

        let other_parent = match (
            wire.body.other_parent_creator_id,
            wire.body.other_parent_index,
        ) {
            (None, None) => None,
            (Some(op_creator_id), Some(op_index)) => {
                Some(self.resolve_other_parent(&creator, op_creator_id, op_index)?)
            }
            _ => {
                return Err(PosetError::MalformedWireEvent(
                    "partial other-parent reference".to_string(),
                ))
            }
        };

        let body = EventBody {
            transactions: wire.body.transactions.clone(),
            internal_transactions: wire.body.internal_transactions.clone(),
            self_parent,
            other_parent,
            creator,
            index: wire.body.index,
            block_signatures: wire.block_signatures(creator),
        };
        Ok(Event::from_parts(
            body,
            wire.signature,
            wire.flag_table.clone(),
            wire.witness_proof.clone(),
            Some(wire.wire_info()),
        ))
    }

    fn resolve_other_parent(
        &self,
        creator: &PublicKey,
        op_creator_id: PeerId,
        op_index: i64,
    ) -> PosetResult<Hash> {
        let op_creator = self.creator_key(op_creator_id)?;
        match self.store.participant_event(&op_creator, op_index) {
            Ok(hash) => Ok(hash),
            Err(e) if e.is_key_not_found() => {
                let root = self.store.get_root(creator)?;
                root.others
                    .values()
                    .find(|o| o.creator_id == op_creator_id && o.index == op_index)
                    .map(|o| o.hash)
                    .ok_or_else(|| PosetError::UnknownOtherParent {
                        event: format!("{}#?", short_hex(creator)),
                        other_parent: format!("id {} #{}", op_creator_id, op_index),
                    })
            }
            Err(e) => Err(e.into()),
        }
    }
}
