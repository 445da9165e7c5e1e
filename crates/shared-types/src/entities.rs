//! # Core Entities
//!
//! Fixed-width byte aliases used throughout the workspace.

/// SHA-256 digest.
pub type Hash = [u8; 32];

/// Ed25519 signature.
pub type Signature = [u8; 64];

/// Ed25519 public key.
pub type PublicKey = [u8; 32];

/// All-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Upper-case hex with a `0x` prefix, the format used in logs and error messages.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode_upper(bytes))
}

/// First six bytes of a hash, for compact log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}
