//! Blocks: finalized, signable transaction batches, one per round-received.

use super::frame::Frame;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{verify_signature, CryptoError, Ed25519KeyPair, Sha256Hasher};
use shared_types::{short_hex, Hash, PublicKey, Signature};
use std::collections::BTreeMap;

/// The signed part of a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub index: i64,
    pub round_received: i64,
    pub transactions: Vec<Vec<u8>>,
}

impl BlockBody {
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256Hasher::new();
        hasher.update(&self.index.to_le_bytes());
        hasher.update(&self.round_received.to_le_bytes());
        hasher.update(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            hasher.update_prefixed(tx);
        }
        hasher.finalize()
    }
}

/// A validator's signature over a block body, gossiped inside events.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignature {
    pub validator: PublicKey,
    pub index: i64,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl BlockSignature {
    pub fn validator_hex(&self) -> String {
        short_hex(&self.validator)
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    body: BlockBody,
    #[serde_as(as = "BTreeMap<_, Bytes>")]
    signatures: BTreeMap<PublicKey, Signature>,
}

impl Block {
    pub fn new(index: i64, round_received: i64, transactions: Vec<Vec<u8>>) -> Self {
        Self {
            body: BlockBody {
                index,
                round_received,
                transactions,
            },
            signatures: BTreeMap::new(),
        }
    }

    /// Concatenate the transactions of a frame's events, in frame order.
    pub fn from_frame(index: i64, frame: &Frame) -> Self {
        let transactions = frame
            .events
            .iter()
            .flat_map(|e| e.transactions().iter().cloned())
            .collect();
        Self::new(index, frame.round, transactions)
    }

    pub fn index(&self) -> i64 {
        self.body.index
    }

    pub fn round_received(&self) -> i64 {
        self.body.round_received
    }

    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.body.transactions
    }

    pub fn body(&self) -> &BlockBody {
        &self.body
    }

    pub fn hash(&self) -> Hash {
        self.body.hash()
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn signatures(&self) -> Vec<BlockSignature> {
        self.signatures
            .iter()
            .map(|(validator, signature)| BlockSignature {
                validator: *validator,
                index: self.body.index,
                signature: *signature,
            })
            .collect()
    }

    pub fn sign(&self, key: &Ed25519KeyPair) -> BlockSignature {
        BlockSignature {
            validator: key.public_key_bytes(),
            index: self.body.index,
            signature: key.sign_bytes(&self.hash()),
        }
    }

    pub fn verify(&self, sig: &BlockSignature) -> Result<bool, CryptoError> {
        if sig.index != self.body.index {
            return Ok(false);
        }
        verify_signature(&sig.validator, &self.hash(), &sig.signature)
    }

    pub fn set_signature(&mut self, sig: BlockSignature) {
        self.signatures.insert(sig.validator, sig.signature);
    }
}
