//! Block aggregation records.

use parking_lot::Mutex;
use shared_crypto::blake3_hash;
use shared_types::{Block, CertifiedBlock, CodecError, Digest, MemberId, Validate};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// A block paired with its digest. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedBlock {
    /// The block itself
    pub block: Block,
    /// BLAKE3 digest of the block's canonical encoding
    pub hash: Digest,
}

impl HashedBlock {
    /// Digest `block`.
    pub fn new(block: Block) -> Result<Self, CodecError> {
        let hash = Digest(blake3_hash(&block.encode()?));
        Ok(Self { block, hash })
    }

    /// Height of the block.
    pub fn height(&self) -> u64 {
        self.block.height
    }
}

/// Witnesses collected for a produced block awaiting a quorum.
///
/// `published` only ever moves from false to true; the winner of that
/// swap is the single publisher of the block.
#[derive(Debug)]
pub struct PendingBlock {
    block: HashedBlock,
    witnesses: Mutex<BTreeMap<MemberId, Validate>>,
    published: AtomicBool,
}

impl PendingBlock {
    /// Create a record seeded with the producer's own witness.
    pub fn new(block: HashedBlock, self_witness: Validate) -> Self {
        let mut witnesses = BTreeMap::new();
        witnesses.insert(self_witness.witness, self_witness);
        Self {
            block,
            witnesses: Mutex::new(witnesses),
            published: AtomicBool::new(false),
        }
    }

    /// The pending block.
    pub fn block(&self) -> &HashedBlock {
        &self.block
    }

    /// Insert a witness. The first attestation per member wins; returns
    /// false for a repeat.
    pub fn add_witness(&self, witness: Validate) -> bool {
        let mut witnesses = self.witnesses.lock();
        if witnesses.contains_key(&witness.witness) {
            return false;
        }
        witnesses.insert(witness.witness, witness);
        true
    }

    /// Number of distinct witnesses.
    pub fn witness_count(&self) -> usize {
        self.witnesses.lock().len()
    }

    /// Whether the block has been published.
    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }

    /// Claim publication if more than `tolerance` witnesses are present.
    /// At most one caller ever receives `Some`.
    pub fn try_certify(&self, tolerance: usize) -> Option<CertifiedBlock> {
        let witnesses = self.witnesses.lock();
        if witnesses.len() <= tolerance {
            return None;
        }
        if self
            .published
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        Some(CertifiedBlock {
            hash: self.block.hash,
            block: self.block.block.clone(),
            certifications: witnesses.values().map(Validate::certification).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BlockBody, Signature};

    fn block(height: u64) -> HashedBlock {
        HashedBlock::new(Block {
            height,
            previous_hash: Digest::ZERO,
            body: BlockBody::Executions(vec![]),
        })
        .unwrap()
    }

    fn witness(hash: Digest, id: u8) -> Validate {
        Validate {
            block_hash: hash,
            witness: MemberId([id; 32]),
            signature: Signature([id; 64]),
        }
    }

    #[test]
    fn test_hash_depends_on_content() {
        assert_ne!(block(1).hash, block(2).hash);
        assert_eq!(block(1).hash, block(1).hash);
        assert_eq!(block(5).height(), 5);
    }

    #[test]
    fn test_first_attestation_per_member_wins() {
        let b = block(1);
        let pending = PendingBlock::new(b.clone(), witness(b.hash, 1));

        let mut repeat = witness(b.hash, 1);
        repeat.signature = Signature([9; 64]);

        assert!(!pending.add_witness(repeat));
        assert!(pending.add_witness(witness(b.hash, 2)));
        assert_eq!(pending.witness_count(), 2);
    }

    #[test]
    fn test_certify_once() {
        let b = block(1);
        let pending = PendingBlock::new(b.clone(), witness(b.hash, 1));
        assert!(pending.try_certify(1).is_none());

        pending.add_witness(witness(b.hash, 2));
        let certified = pending.try_certify(1).unwrap();
        assert_eq!(certified.certifications.len(), 2);
        assert_eq!(certified.hash, b.hash);
        assert!(pending.is_published());

        pending.add_witness(witness(b.hash, 3));
        assert!(pending.try_certify(1).is_none());
    }
}
