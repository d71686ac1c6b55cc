//! # In-Memory View Context
//!
//! A complete [`ViewContext`] over local memory: Ed25519 witness signing
//! and verification, checkpoint and reconfiguration bodies, and a record
//! of published blocks. Suitable for single-process committees and
//! tests.

use crate::domain::HashedBlock;
use crate::ports::ViewContext;
use parking_lot::Mutex;
use shared_crypto::{blake3_hash_many, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use shared_types::{
    CertifiedBlock, Checkpoint, Digest, JoinRequest, MemberId, Reconfigure, Signature, Validate,
};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Identity of a key pair as a committee member.
pub fn member_id(keypair: &Ed25519KeyPair) -> MemberId {
    MemberId(*keypair.public_key().as_bytes())
}

/// Verify `signature` by `member` over `message`.
pub fn verify_member_signature(member: &MemberId, message: &[u8], signature: &Signature) -> bool {
    Ed25519PublicKey::from_bytes(member.0)
        .and_then(|key| key.verify(message, &Ed25519Signature::from_bytes(signature.0)))
        .is_ok()
}

/// Sign a request to join `view` with `keypair`.
pub fn sign_join(keypair: &Ed25519KeyPair, view: Digest) -> JoinRequest {
    JoinRequest {
        member: member_id(keypair),
        view,
        signature: Signature(*keypair.sign(view.as_bytes()).as_bytes()),
    }
}

/// Sign a witness for `block_hash` with `keypair`.
pub fn sign_validation(keypair: &Ed25519KeyPair, block_hash: Digest) -> Validate {
    let message = Validate::signing_message(&block_hash);
    Validate {
        block_hash,
        witness: member_id(keypair),
        signature: Signature(*keypair.sign(&message).as_bytes()),
    }
}

#[derive(Debug, Default)]
struct Chain {
    published: Vec<CertifiedBlock>,
    state: Option<Digest>,
}

/// In-memory view context.
#[derive(Debug)]
pub struct MemoryViewContext {
    view_id: Digest,
    keypair: Ed25519KeyPair,
    member: MemberId,
    committee: BTreeSet<MemberId>,
    checkpoint_target: u64,
    chain: Mutex<Chain>,
}

impl MemoryViewContext {
    /// Create a context for `view_id` signing as `keypair`.
    pub fn new(view_id: Digest, keypair: Ed25519KeyPair, committee: impl IntoIterator<Item = MemberId>) -> Self {
        let member = member_id(&keypair);
        Self {
            view_id,
            keypair,
            member,
            committee: committee.into_iter().collect(),
            checkpoint_target: 0,
            chain: Mutex::new(Chain::default()),
        }
    }

    /// Seed the state digest a checkpoint will capture. Without one (and
    /// before any publication) no checkpoint can be produced.
    pub fn with_checkpoint_state(self, state: Digest) -> Self {
        self.chain.lock().state = Some(state);
        self
    }

    /// Blocks until the next checkpoint, written into reconfiguration
    /// bodies. Zero makes the next view open with a checkpoint.
    pub fn with_checkpoint_target(mut self, target: u64) -> Self {
        self.checkpoint_target = target;
        self
    }

    /// Certified blocks published so far, in publication order.
    pub fn published(&self) -> Vec<CertifiedBlock> {
        self.chain.lock().published.clone()
    }

    /// Number of certified blocks published.
    pub fn published_count(&self) -> usize {
        self.chain.lock().published.len()
    }
}

impl ViewContext for MemoryViewContext {
    fn view_id(&self) -> Digest {
        self.view_id
    }

    fn member(&self) -> MemberId {
        self.member
    }

    fn committee(&self) -> Vec<MemberId> {
        self.committee.iter().copied().collect()
    }

    fn checkpoint(&self, tip: &HashedBlock) -> Option<Checkpoint> {
        let chain = self.chain.lock();
        let state = chain.state?;
        Some(Checkpoint {
            state: Digest(blake3_hash_many(&[state.as_bytes(), tip.hash.as_bytes()])),
            byte_size: chain.published.len() as u64,
        })
    }

    fn reconfigure(&self, joins: &[JoinRequest], next_view_id: Digest, tip: &HashedBlock) -> Reconfigure {
        debug!(
            view = %self.view_id,
            next_view = %next_view_id,
            height = tip.height(),
            members = joins.len(),
            "Reconfiguration body"
        );
        Reconfigure {
            id: next_view_id,
            members: joins.to_vec(),
            checkpoint_target: self.checkpoint_target,
        }
    }

    fn generate_validation(&self, block: &HashedBlock) -> Validate {
        sign_validation(&self.keypair, block.hash)
    }

    fn validate(&self, block: &HashedBlock, witness: &Validate) -> bool {
        if witness.block_hash != block.hash || !self.committee.contains(&witness.witness) {
            trace!(view = %self.view_id, witness = %witness.witness, "Witness not from committee");
            return false;
        }
        let message = Validate::signing_message(&block.hash);
        verify_member_signature(&witness.witness, &message, &witness.signature)
    }

    fn publish(&self, certified: CertifiedBlock) {
        let mut chain = self.chain.lock();
        chain.state = Some(certified.hash);
        chain.published.push(certified);
    }
}
