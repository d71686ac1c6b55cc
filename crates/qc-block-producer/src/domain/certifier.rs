//! # Quorum Certifier
//!
//! Owns the table of pending blocks keyed by hash.
//! [`QuorumCertifier::try_certify`] is the single gate through which a
//! block becomes certified.
//!
//! A block is certifiable once it carries more than `f` distinct
//! witnesses. Certification removes the entry, so later witnesses for
//! the same hash find nothing and are ignored.

use super::entities::{HashedBlock, PendingBlock};
use dashmap::DashMap;
use shared_types::{CertifiedBlock, Digest, Validate};
use std::sync::Arc;
use tracing::{error, trace};

/// Outcome of recording one witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// No pending block with that hash (never produced, or already published)
    Unknown,
    /// The view context rejected the witness
    Rejected,
    /// Witness stored
    Accepted,
    /// The member already witnessed this block; the first attestation stands
    Repeated,
}

/// Pending-block table with at-most-once certification.
#[derive(Debug)]
pub struct QuorumCertifier {
    tolerance: usize,
    pending: DashMap<Digest, Arc<PendingBlock>>,
}

impl QuorumCertifier {
    /// Create a certifier for fault tolerance `f`.
    pub fn new(tolerance: usize) -> Self {
        Self {
            tolerance,
            pending: DashMap::new(),
        }
    }

    /// Fault tolerance `f`.
    pub fn tolerance(&self) -> usize {
        self.tolerance
    }

    /// Number of blocks awaiting a quorum.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `hash` is awaiting a quorum.
    pub fn is_pending(&self, hash: &Digest) -> bool {
        self.pending.contains_key(hash)
    }

    /// Track a freshly produced block seeded with our own witness.
    ///
    /// Returns `None` if the hash is already tracked. That cannot happen
    /// under a correct ordering engine and is logged as an error.
    pub fn register(&self, block: HashedBlock, self_witness: Validate) -> Option<Arc<PendingBlock>> {
        use dashmap::mapref::entry::Entry;

        match self.pending.entry(block.hash) {
            Entry::Occupied(_) => {
                error!(hash = %block.hash, height = block.height(), "Block already pending");
                None
            }
            Entry::Vacant(slot) => {
                let pending = Arc::new(PendingBlock::new(block, self_witness));
                slot.insert(Arc::clone(&pending));
                Some(pending)
            }
        }
    }

    /// Store `witness` against its pending block without testing the
    /// threshold. `verify` checks the witness against the block.
    pub fn record<V>(&self, witness: Validate, verify: V) -> Recorded
    where
        V: FnOnce(&HashedBlock, &Validate) -> bool,
    {
        // Clone out of the map so no shard lock is held across `verify`.
        let Some(pending) = self.lookup(&witness.block_hash) else {
            trace!(hash = %witness.block_hash, witness = %witness.witness, "Witness for unknown block");
            return Recorded::Unknown;
        };
        if !verify(pending.block(), &witness) {
            trace!(hash = %witness.block_hash, witness = %witness.witness, "Invalid witness");
            return Recorded::Rejected;
        }
        if pending.add_witness(witness) {
            Recorded::Accepted
        } else {
            Recorded::Repeated
        }
    }

    /// Certify `hash` if it has reached the quorum. Removes the entry on
    /// success; concurrent callers for the same hash see `None`.
    pub fn try_certify(&self, hash: &Digest) -> Option<CertifiedBlock> {
        let pending = self.lookup(hash)?;
        let certified = pending.try_certify(self.tolerance)?;
        self.pending.remove(hash);
        Some(certified)
    }

    /// Record `witness` and certify its block if it crossed the quorum.
    ///
    /// Convenience for a lone witness. A batch should [`record`] every
    /// witness first and then call [`try_certify`] once per touched hash.
    ///
    /// [`record`]: QuorumCertifier::record
    /// [`try_certify`]: QuorumCertifier::try_certify
    pub fn admit<V>(&self, witness: Validate, verify: V) -> Option<CertifiedBlock>
    where
        V: FnOnce(&HashedBlock, &Validate) -> bool,
    {
        let hash = witness.block_hash;
        match self.record(witness, verify) {
            Recorded::Accepted => self.try_certify(&hash),
            Recorded::Unknown | Recorded::Rejected | Recorded::Repeated => None,
        }
    }

    fn lookup(&self, hash: &Digest) -> Option<Arc<PendingBlock>> {
        self.pending.get(hash).map(|entry| Arc::clone(entry.value()))
    }
}
