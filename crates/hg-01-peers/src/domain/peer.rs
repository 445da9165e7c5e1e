//! A single participant.

use serde::{Deserialize, Serialize};
use shared_crypto::sha256;
use shared_types::{to_hex, PublicKey};

/// Numeric participant id, derived from the public key.
pub type PeerId = u64;

/// Id derivation: the first four bytes (big-endian) of SHA-256 over the key.
pub fn peer_id_from_key(pub_key: &PublicKey) -> PeerId {
    let digest = sha256(pub_key);
    u64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    id: PeerId,
    pub pub_key: PublicKey,
    pub net_addr: String,
}

impl Peer {
    pub fn new(pub_key: PublicKey, net_addr: impl Into<String>) -> Self {
        Self {
            id: peer_id_from_key(&pub_key),
            pub_key,
            net_addr: net_addr.into(),
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn pub_key_hex(&self) -> String {
        to_hex(&self.pub_key)
    }
}
