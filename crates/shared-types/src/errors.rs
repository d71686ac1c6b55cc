//! # Error Types
//!
//! Defines error types used across crates.

use thiserror::Error;

/// Errors raised while encoding or decoding wire payloads.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// Payload could not be serialized.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Payload bytes are malformed or truncated.
    #[error("Decode failed: {0}")]
    Decode(String),
}
