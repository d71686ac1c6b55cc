//! Errors raised by key parsing and signature checks.

use thiserror::Error;

/// Why a member key or signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The signature does not match the key and message
    #[error("signature does not verify")]
    SignatureVerificationFailed,

    /// The bytes are not a valid Ed25519 point
    #[error("not an Ed25519 public key")]
    InvalidPublicKey,
}
