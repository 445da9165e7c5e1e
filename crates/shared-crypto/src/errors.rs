//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature did not verify against the key and message
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Bytes do not encode a curve point
    #[error("Invalid public key")]
    InvalidPublicKey,
}
