//! # Shared Crypto
//!
//! Key and digest primitives for committee members.
//!
//! | Module | Algorithm | Used for |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | Block hashes, checkpoint digests, committee selection |
//! | `signatures` | Ed25519 | Witness attestations, join requests |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

pub use errors::CryptoError;
pub use hashing::{blake3_hash, blake3_hash_many, blake3_keyed_hash, Hash};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
