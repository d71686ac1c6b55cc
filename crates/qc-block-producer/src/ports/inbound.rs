//! Inbound ports (driving side - API)

use crate::domain::EarnerState;
use crate::error::Result;
use shared_types::{Digest, Transaction};

/// API: callbacks from the ordering engine
///
/// Implementations absorb every failure; nothing is returned across
/// the callback boundary.
pub trait OrderingSink: Send + Sync {
    /// An ordered batch of opaque units for one round.
    fn on_pre_block(&self, units: &[Vec<u8>], last: bool);

    /// An epoch boundary.
    fn on_epoch(&self, epoch: u32);
}

/// API: block producer control
pub trait BlockProducerApi: Send + Sync {
    /// Start production. Idempotent.
    fn start(&self);

    /// Stop production. Idempotent, callable from any context.
    fn stop(&self);

    /// Submit a client transaction.
    ///
    /// Fails fast with [`crate::ProductionError::BufferFull`].
    fn submit(&self, transaction: Transaction) -> Result<()>;

    /// Snapshot of producer state.
    fn status(&self) -> ProducerStatus;
}

/// Producer state snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducerStatus {
    /// Earner state
    pub state: EarnerState,
    /// Whether the lifecycle is running
    pub running: bool,
    /// Height of the current tip
    pub tip_height: u64,
    /// Hash of the current tip
    pub tip_hash: Digest,
    /// Blocks awaiting a quorum
    pub pending_blocks: usize,
    /// Join requests gathered for the next view
    pub joins: usize,
    /// Next view id, once assembly began
    pub next_view_id: Option<Digest>,
}
