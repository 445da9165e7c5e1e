//! Events: the nodes of the DAG.
//!
//! An event is a signed body (payload, parent references, creator, index)
//! plus consensus metadata that the pipeline fills in as it advances. The
//! identity of an event is the SHA-256 of its body; metadata never feeds the
//! hash, so an event keeps its identity from insertion to commitment.

use super::block::BlockSignature;
use super::wire::WireInfo;
use hg_01_peers::{Peer, PeerId};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{sha256, verify_signature, CryptoError, Ed25519KeyPair, Sha256Hasher};
use shared_types::{Hash, PublicKey, Signature};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Witness hash → reachability marker.
pub type FlagTable = BTreeMap<Hash, i64>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternalTransactionKind {
    PeerAdd,
    PeerRemove,
}

/// A participant-set change carried through consensus. Applying it is the
/// host's job once the containing block commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalTransaction {
    pub kind: InternalTransactionKind,
    pub peer: Peer,
}

impl InternalTransaction {
    pub fn peer_add(peer: Peer) -> Self {
        Self {
            kind: InternalTransactionKind::PeerAdd,
            peer,
        }
    }

    pub fn peer_remove(peer: Peer) -> Self {
        Self {
            kind: InternalTransactionKind::PeerRemove,
            peer,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBody {
    pub transactions: Vec<Vec<u8>>,
    pub internal_transactions: Vec<InternalTransaction>,
    pub self_parent: Hash,
    pub other_parent: Option<Hash>,
    pub creator: PublicKey,
    pub index: i64,
    pub block_signatures: Vec<BlockSignature>,
}

impl EventBody {
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256Hasher::new();
        hasher.update(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            hasher.update_prefixed(tx);
        }
        hasher.update(&(self.internal_transactions.len() as u64).to_le_bytes());
        for itx in &self.internal_transactions {
            let kind = match itx.kind {
                InternalTransactionKind::PeerAdd => 0u8,
                InternalTransactionKind::PeerRemove => 1u8,
            };
            hasher.update(&[kind]);
            hasher.update(&itx.peer.pub_key);
            hasher.update_prefixed(itx.peer.net_addr.as_bytes());
        }
        hasher.update(&self.self_parent);
        match &self.other_parent {
            Some(op) => hasher.update(&[1u8]).update(op),
            None => hasher.update(&[0u8]),
        };
        hasher.update(&self.creator);
        hasher.update(&self.index.to_le_bytes());
        hasher.update(&(self.block_signatures.len() as u64).to_le_bytes());
        for bs in &self.block_signatures {
            hasher.update(&bs.validator);
            hasher.update(&bs.index.to_le_bytes());
            hasher.update(&bs.signature);
        }
        hasher.finalize()
    }
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    body: EventBody,
    #[serde_as(as = "Bytes")]
    signature: Signature,
    flag_table: FlagTable,
    witness_proof: Vec<Hash>,
    wire_info: Option<WireInfo>,
    topological_index: Option<u64>,
    round: Option<i64>,
    lamport_timestamp: Option<i64>,
    round_received: Option<i64>,
    #[serde(skip)]
    hash: OnceLock<Hash>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
            && self.signature == other.signature
            && self.flag_table == other.flag_table
            && self.witness_proof == other.witness_proof
    }
}

impl Eq for Event {}

impl Event {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transactions: Vec<Vec<u8>>,
        internal_transactions: Vec<InternalTransaction>,
        block_signatures: Vec<BlockSignature>,
        self_parent: Hash,
        other_parent: Option<Hash>,
        creator: PublicKey,
        index: i64,
        flag_table: FlagTable,
    ) -> Self {
        let body = EventBody {
            transactions,
            internal_transactions,
            self_parent,
            other_parent,
            creator,
            index,
            block_signatures,
        };
        Self::from_parts(body, [0u8; 64], flag_table, Vec::new(), None)
    }

    pub(crate) fn from_parts(
        body: EventBody,
        signature: Signature,
        flag_table: FlagTable,
        witness_proof: Vec<Hash>,
        wire_info: Option<WireInfo>,
    ) -> Self {
        Self {
            body,
            signature,
            flag_table,
            witness_proof,
            wire_info,
            topological_index: None,
            round: None,
            lamport_timestamp: None,
            round_received: None,
            hash: OnceLock::new(),
        }
    }

    pub fn hash(&self) -> &Hash {
        self.hash.get_or_init(|| self.body.hash())
    }

    pub fn body(&self) -> &EventBody {
        &self.body
    }

    pub fn creator(&self) -> &PublicKey {
        &self.body.creator
    }

    pub fn self_parent(&self) -> &Hash {
        &self.body.self_parent
    }

    pub fn other_parent(&self) -> Option<&Hash> {
        self.body.other_parent.as_ref()
    }

    pub fn index(&self) -> i64 {
        self.body.index
    }

    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.body.transactions
    }

    pub fn internal_transactions(&self) -> &[InternalTransaction] {
        &self.body.internal_transactions
    }

    pub fn block_signatures(&self) -> &[BlockSignature] {
        &self.body.block_signatures
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// An event carries load when it has any payload to commit.
    pub fn is_loaded(&self) -> bool {
        !self.body.transactions.is_empty() || !self.body.internal_transactions.is_empty()
    }

    pub fn sign(&mut self, key: &Ed25519KeyPair) {
        self.signature = key.sign_bytes(self.hash());
    }

    pub fn verify(&self) -> Result<bool, CryptoError> {
        verify_signature(&self.body.creator, self.hash(), &self.signature)
    }

    pub fn flag_table(&self) -> &FlagTable {
        &self.flag_table
    }

    /// Union of this event's flag table with another.
    pub fn merge_flag_table(&self, other: &FlagTable) -> FlagTable {
        let mut merged = self.flag_table.clone();
        for (hash, flag) in other {
            merged.insert(*hash, *flag);
        }
        merged
    }

    pub fn witness_proof(&self) -> &[Hash] {
        &self.witness_proof
    }

    pub fn wire_info(&self) -> Option<&WireInfo> {
        self.wire_info.as_ref()
    }

    pub fn topological_index(&self) -> Option<u64> {
        self.topological_index
    }

    pub fn round(&self) -> Option<i64> {
        self.round
    }

    pub fn lamport_timestamp(&self) -> Option<i64> {
        self.lamport_timestamp
    }

    pub fn round_received(&self) -> Option<i64> {
        self.round_received
    }

    pub(crate) fn set_flag_table(&mut self, flag_table: FlagTable) {
        self.flag_table = flag_table;
    }

    pub(crate) fn set_witness_proof(&mut self, proof: Vec<Hash>) {
        self.witness_proof = proof;
    }

    pub(crate) fn set_wire_info(&mut self, info: WireInfo) {
        self.wire_info = Some(info);
    }

    pub(crate) fn set_topological_index(&mut self, index: u64) {
        self.topological_index = Some(index);
    }

    pub(crate) fn set_round(&mut self, round: i64) {
        self.round = Some(round);
    }

    pub(crate) fn set_lamport_timestamp(&mut self, timestamp: i64) {
        self.lamport_timestamp = Some(timestamp);
    }

    pub(crate) fn set_round_received(&mut self, round: i64) {
        self.round_received = Some(round);
    }

    /// Drop everything the pipeline derived locally, keeping the signed body
    /// and the gossiped flag table / witness proof.
    pub fn clear_consensus_metadata(&mut self) {
        self.topological_index = None;
        self.round = None;
        self.lamport_timestamp = None;
        self.round_received = None;
    }
}

/// Self-parent hash of a participant's base root.
pub fn root_self_parent(creator_id: PeerId) -> Hash {
    let mut seed = b"root".to_vec();
    seed.extend_from_slice(&creator_id.to_be_bytes());
    sha256(&seed)
}

/// Pseudo-random coin used by coin rounds.
pub fn middle_bit(hash: &Hash) -> bool {
    hash[hash.len() / 2] != 0
}
