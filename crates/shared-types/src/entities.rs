//! # Core Domain Entities
//!
//! Defines the chain entities produced and certified by a committee.
//!
//! ## Clusters
//!
//! - **Identity**: `Digest`, `MemberId`, `Signature`
//! - **Chain**: `Block`, `BlockBody`, `Reconfigure`, `Checkpoint`, `Transaction`
//! - **Certification**: `Validate`, `Certification`, `CertifiedBlock`
//! - **Membership**: `JoinRequest`

use crate::errors::CodecError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte cryptographic digest (block hashes, view ids).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// The all-zero digest, used as the parent of genesis.
    pub const ZERO: Digest = Digest([0u8; 32]);

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        write!(f, "{}", hex::encode(&self.0[..6]))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Identity of a committee member (its Ed25519 verifying key).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct MemberId(pub [u8; 32]);

impl MemberId {
    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..6]))
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberId({})", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for MemberId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 64-byte Ed25519 signature.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] pub [u8; 64]);

impl Signature {
    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// A client transaction. The content is opaque to the committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Client-chosen nonce, makes otherwise identical payloads distinct.
    pub nonce: u64,
    /// Application payload.
    pub content: Vec<u8>,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(nonce: u64, content: impl Into<Vec<u8>>) -> Self {
        Self {
            nonce,
            content: content.into(),
        }
    }

    /// Compute the transaction hash.
    pub fn hash(&self) -> Digest {
        use sha2::{Digest as _, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(&self.content);
        Digest(hasher.finalize().into())
    }

    /// Approximate encoded size, used for buffer accounting.
    pub fn byte_size(&self) -> usize {
        self.content.len() + 8
    }
}

/// A request from a prospective member to join the next view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// The joining member.
    pub member: MemberId,
    /// The view id being joined.
    pub view: Digest,
    /// Member's signature over the view id.
    pub signature: Signature,
}

/// Committee hand-off body naming the next view and its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconfigure {
    /// Id of the view this block establishes.
    pub id: Digest,
    /// Members of the new committee, sorted by id.
    pub members: Vec<JoinRequest>,
    /// Number of blocks until the next checkpoint; 0 means checkpoint first.
    pub checkpoint_target: u64,
}

/// A point from which state can be rebuilt without replaying the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Digest of the application state at this height.
    pub state: Digest,
    /// Size of the state snapshot in bytes.
    pub byte_size: u64,
}

/// The payload carried by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockBody {
    /// First block of the chain, installs the initial view.
    Genesis(Reconfigure),
    /// Ordinary block of ordered transactions.
    Executions(Vec<Transaction>),
    /// Marker naming the prospective next view.
    Assemble {
        /// Id of the view being assembled.
        next_view: Digest,
    },
    /// Committee hand-off.
    Reconfigure(Reconfigure),
    /// State checkpoint.
    Checkpoint(Checkpoint),
}

impl BlockBody {
    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BlockBody::Genesis(_) => "genesis",
            BlockBody::Executions(_) => "executions",
            BlockBody::Assemble { .. } => "assemble",
            BlockBody::Reconfigure(_) => "reconfigure",
            BlockBody::Checkpoint(_) => "checkpoint",
        }
    }
}

/// A block in the hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Height in the chain (genesis is 0).
    pub height: u64,
    /// Hash of the parent block.
    pub previous_hash: Digest,
    /// Block payload.
    pub body: BlockBody,
}

impl Block {
    /// Canonical encoding, the input to block digesting.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Whether this block installs a view that must checkpoint first.
    pub fn requires_checkpoint(&self) -> bool {
        matches!(&self.body, BlockBody::Reconfigure(r) if r.checkpoint_target == 0)
    }
}

// =============================================================================
// CLUSTER C: CERTIFICATION
// =============================================================================

/// A member's signed attestation that it validated a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validate {
    /// Hash of the attested block.
    pub block_hash: Digest,
    /// The attesting member.
    pub witness: MemberId,
    /// Signature over [`Validate::signing_message`].
    pub signature: Signature,
}

impl Validate {
    /// Domain-separated message a witness signs for `block_hash`.
    pub fn signing_message(block_hash: &Digest) -> Vec<u8> {
        let mut message = Vec::with_capacity(48);
        message.extend_from_slice(b"qc/validate/v1");
        message.extend_from_slice(block_hash.as_bytes());
        message
    }

    /// The certification carried into a certified block.
    pub fn certification(&self) -> Certification {
        Certification {
            witness: self.witness,
            signature: self.signature,
        }
    }
}

/// A witness signature as stored in a certified block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    /// The attesting member.
    pub witness: MemberId,
    /// The witness signature.
    pub signature: Signature,
}

/// A block together with a quorum of witness signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifiedBlock {
    /// Hash of `block`.
    pub hash: Digest,
    /// The certified block.
    pub block: Block,
    /// Witness signatures, sorted by witness id.
    pub certifications: Vec<Certification>,
}

impl CertifiedBlock {
    /// Height of the certified block.
    pub fn height(&self) -> u64 {
        self.block.height
    }
}
