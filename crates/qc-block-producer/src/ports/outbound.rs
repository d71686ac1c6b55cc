//! Outbound ports (driven side - SPI)
//!
//! All calls are synchronous and must not block: they are made from
//! ordering-engine callbacks.

use crate::domain::HashedBlock;
use shared_types::{
    CertifiedBlock, Checkpoint, Digest, JoinRequest, MemberId, Reconfigure, Transaction, Validate,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

/// Port: the view (committee) this producer serves
pub trait ViewContext: Send + Sync {
    /// Id of the current view.
    fn view_id(&self) -> Digest;

    /// The local member.
    fn member(&self) -> MemberId;

    /// Members of the current committee.
    fn committee(&self) -> Vec<MemberId>;

    /// Checkpoint body for the state at `tip`, or `None` if one cannot be
    /// produced.
    fn checkpoint(&self, tip: &HashedBlock) -> Option<Checkpoint>;

    /// Reconfiguration body installing `next_view_id` with `joins`
    /// (sorted by member).
    fn reconfigure(&self, joins: &[JoinRequest], next_view_id: Digest, tip: &HashedBlock)
        -> Reconfigure;

    /// Sign a witness for `block` as the local member.
    fn generate_validation(&self, block: &HashedBlock) -> Validate;

    /// Check `witness` is a valid attestation of `block` by a committee
    /// member.
    fn validate(&self, block: &HashedBlock, witness: &Validate) -> bool;

    /// Persist and announce a certified block.
    fn publish(&self, certified: CertifiedBlock);
}

/// Port: outbound unit batching that feeds the ordering engine
pub trait UnitSource: Send + Sync {
    /// Queue a client transaction. Returns false if full or not accepting.
    fn offer_transaction(&self, transaction: Transaction) -> bool;

    /// Queue a witness for circulation to the committee.
    fn offer_validation(&self, validation: Validate);

    /// Refuse (or resume accepting) new transactions. Queued ones are
    /// still packed.
    fn validations_only(&self, enabled: bool);

    /// Release resources; later offers are refused. Returns the number
    /// of accepted transactions discarded unsent.
    fn close(&self) -> usize;
}

/// Port: the ordering engine controller
pub trait OrderingController: Send + Sync {
    /// Start ordering.
    fn start(&self);
    /// Stop ordering.
    fn stop(&self);
}

/// Port: gossip dissemination of ordering traffic
pub trait GossipCoordinator: Send + Sync {
    /// Start gossiping.
    fn start(&self);
    /// Stop gossiping.
    fn stop(&self);
}

/// Port: receives the outcome of a committee assembly
pub trait AssemblyListener: Send + Sync {
    /// Join requests gathered for the next view.
    fn assembly_complete(&self, slate: Vec<JoinRequest>);

    /// The assembly could not complete.
    fn assembly_failed(&self);
}

/// Port: a running committee assembly
pub trait ViewAssembly: Send + Sync {
    /// Begin gathering.
    fn start(&self);

    /// Abandon the assembly. Must not call back into the listener.
    fn stop(&self);
}

/// Port: creates committee assemblies
pub trait AssemblyFactory: Send + Sync {
    /// Create an assembly for `next_view_id` over `members`.
    fn assemble(
        &self,
        next_view_id: Digest,
        members: BTreeSet<MemberId>,
        listener: Weak<dyn AssemblyListener>,
    ) -> Arc<dyn ViewAssembly>;
}
