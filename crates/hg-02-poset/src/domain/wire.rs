//! Compact gossip representation of events.
//!
//! Parent hashes are replaced by `(creator id, index)` pairs, which the
//! receiver resolves back against its own store or the creator's root. The
//! other-parent reference carries explicit presence, so creator id 0 is a
//! legal id rather than an "unset" marker.

use super::block::BlockSignature;
use super::error::{PosetError, PosetResult};
use super::event::{Event, FlagTable, InternalTransaction};
use hg_01_peers::PeerId;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{Hash, PublicKey, Signature};

/// Parent positions of an event in creator-id space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInfo {
    pub creator_id: PeerId,
    pub self_parent_index: i64,
    pub other_parent_creator_id: Option<PeerId>,
    pub other_parent_index: Option<i64>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBlockSignature {
    pub index: i64,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBody {
    pub transactions: Vec<Vec<u8>>,
    pub internal_transactions: Vec<InternalTransaction>,
    pub block_signatures: Vec<WireBlockSignature>,
    pub creator_id: PeerId,
    pub index: i64,
    pub self_parent_index: i64,
    pub other_parent_creator_id: Option<PeerId>,
    pub other_parent_index: Option<i64>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    pub body: WireBody,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub flag_table: FlagTable,
    pub witness_proof: Vec<Hash>,
}

impl WireEvent {
    pub fn encode(&self) -> PosetResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PosetError::MalformedWireEvent(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> PosetResult<Self> {
        bincode::deserialize(bytes).map_err(|e| PosetError::MalformedWireEvent(e.to_string()))
    }

    /// Block signatures carried by the event, attributed to its creator.
    pub fn block_signatures(&self, creator: PublicKey) -> Vec<BlockSignature> {
        self.body
            .block_signatures
            .iter()
            .map(|bs| BlockSignature {
                validator: creator,
                index: bs.index,
                signature: bs.signature,
            })
            .collect()
    }

    pub(crate) fn wire_info(&self) -> WireInfo {
        WireInfo {
            creator_id: self.body.creator_id,
            self_parent_index: self.body.self_parent_index,
            other_parent_creator_id: self.body.other_parent_creator_id,
            other_parent_index: self.body.other_parent_index,
        }
    }
}

impl Event {
    /// Requires wire info, which the poset fills in at insertion.
    pub fn to_wire(&self) -> PosetResult<WireEvent> {
        let info = self.wire_info().ok_or_else(|| {
            PosetError::MalformedWireEvent("wire info not computed".to_string())
        })?;
        let block_signatures = self
            .block_signatures()
            .iter()
            .map(|bs| WireBlockSignature {
                index: bs.index,
                signature: bs.signature,
            })
            .collect();
        Ok(WireEvent {
            body: WireBody {
                transactions: self.transactions().to_vec(),
                internal_transactions: self.internal_transactions().to_vec(),
                block_signatures,
                creator_id: info.creator_id,
                index: self.index(),
                self_parent_index: info.self_parent_index,
                other_parent_creator_id: info.other_parent_creator_id,
                other_parent_index: info.other_parent_index,
            },
            signature: *self.signature(),
            flag_table: self.flag_table().clone(),
            witness_proof: self.witness_proof().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::root_self_parent;

    #[test]
    fn test_to_wire_requires_wire_info() {
        let ev = Event::new(
            vec![],
            vec![],
            vec![],
            root_self_parent(0),
            None,
            [1u8; 32],
            0,
            FlagTable::new(),
        );
        assert!(matches!(
            ev.to_wire(),
            Err(PosetError::MalformedWireEvent(_))
        ));
    }

    #[test]
    fn test_creator_id_zero_is_preserved() {
        let mut ev = Event::new(
            vec![b"tx".to_vec()],
            vec![],
            vec![],
            root_self_parent(0),
            Some([9u8; 32]),
            [1u8; 32],
            0,
            FlagTable::from([([9u8; 32], 1)]),
        );
        ev.set_wire_info(WireInfo {
            creator_id: 0,
            self_parent_index: -1,
            other_parent_creator_id: Some(0),
            other_parent_index: Some(4),
        });

        let wire = ev.to_wire().unwrap();
        let decoded = WireEvent::decode(&wire.encode().unwrap()).unwrap();

        assert_eq!(decoded, wire);
        assert_eq!(decoded.body.other_parent_creator_id, Some(0));
        assert_eq!(decoded.body.creator_id, 0);
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        assert!(matches!(
            WireEvent::decode(&[0xff, 0x01]),
            Err(PosetError::MalformedWireEvent(_))
        ));
    }
}
