//! # Block Producer Service
//!
//! Turns ordering-engine output into a hash chain of quorum-certified
//! blocks for one view, and drives the hand-off to the next view.
//!
//! ## Flow per pre-block
//!
//! 1. Decode units; a malformed unit is logged and dropped.
//! 2. Record every witness, then certify the blocks that crossed the
//!    quorum. Certified blocks are published strictly in height order; a
//!    block certified ahead of its parent waits for it.
//! 3. Install the next block at the tip, self-witness it, register it
//!    with the certifier and circulate the witness.
//! 4. On the last pre-block, complete. Otherwise count down towards the
//!    Assemble block that opens the next committee's assembly.

use crate::config::ProducerConfig;
use crate::domain::{
    view_members_of, Driver, Earner, EarnerEffect, EarnerEvent, EpochTrigger, HashedBlock,
    QuorumCertifier, ReconfigurationCountdown, Recorded,
};
use crate::error::{ProductionError, Result};
use crate::metrics::Metrics;
use crate::ports::{
    AssemblyFactory, AssemblyListener, BlockProducerApi, GossipCoordinator, OrderingController,
    OrderingSink, ProducerStatus, UnitSource, ViewAssembly, ViewContext,
};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use shared_types::{
    Block, BlockBody, CertifiedBlock, Digest, JoinRequest, MemberId, Transaction, UnitData,
    Validate,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, trace, warn};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Collaborators of a producer.
pub struct ProducerPorts {
    /// The view being served
    pub view: Arc<dyn ViewContext>,
    /// Outbound unit batching
    pub source: Arc<dyn UnitSource>,
    /// Ordering engine controller
    pub controller: Arc<dyn OrderingController>,
    /// Gossip coordinator
    pub coordinator: Arc<dyn GossipCoordinator>,
    /// Committee assembly factory
    pub assemblies: Arc<dyn AssemblyFactory>,
}

#[derive(Debug, Default)]
struct NextView {
    id: Option<Digest>,
    members: BTreeSet<MemberId>,
}

/// Certified blocks waiting for their turn to be published.
#[derive(Debug)]
struct Publication {
    next_height: u64,
    ready: BTreeMap<u64, CertifiedBlock>,
}

/// Block producer for one view.
pub struct BlockProducer {
    config: ProducerConfig,
    member: MemberId,
    ports: ProducerPorts,
    certifier: QuorumCertifier,
    tip: RwLock<Arc<HashedBlock>>,
    countdown: ReconfigurationCountdown,
    epochs: EpochTrigger,
    earner: Driver<Earner>,
    lifecycle: AtomicU8,
    joins: DashMap<MemberId, JoinRequest>,
    next_view: Mutex<NextView>,
    assembly: Mutex<Option<Arc<dyn ViewAssembly>>>,
    publication: Mutex<Publication>,
    metrics: Arc<Metrics>,
    this: Weak<BlockProducer>,
}

impl BlockProducer {
    /// Create a producer continuing the chain from `last_block`.
    pub fn new(
        config: ProducerConfig,
        last_block: HashedBlock,
        ports: ProducerPorts,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let member = ports.view.member();
        let view_id = ports.view.view_id();
        info!(
            %member,
            view = %view_id,
            tip = %last_block.hash,
            height = last_block.height(),
            tolerance = config.tolerance_level,
            "[producer] Initializing block producer"
        );

        let next_height = last_block.height() + 1;
        Ok(Arc::new_cyclic(|this| Self {
            certifier: QuorumCertifier::new(config.tolerance_level),
            tip: RwLock::new(Arc::new(last_block)),
            countdown: ReconfigurationCountdown::new(config.reconfiguration_countdown),
            epochs: EpochTrigger::new(config.reconfiguration_epoch()),
            earner: Driver::new(member.to_string(), Default::default()),
            lifecycle: AtomicU8::new(IDLE),
            joins: DashMap::new(),
            next_view: Mutex::new(NextView::default()),
            assembly: Mutex::new(None),
            publication: Mutex::new(Publication {
                next_height,
                ready: BTreeMap::new(),
            }),
            metrics: Arc::new(Metrics::new()),
            this: this.clone(),
            config,
            member,
            ports,
        }))
    }

    /// Current chain tip.
    pub fn tip(&self) -> Arc<HashedBlock> {
        Arc::clone(&*self.tip.read())
    }

    /// The local member.
    pub fn member(&self) -> MemberId {
        self.member
    }

    /// Producer metrics.
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Whether `hash` is awaiting a quorum.
    pub fn is_pending(&self, hash: &Digest) -> bool {
        self.certifier.is_pending(hash)
    }

    /// Members selected for the next committee, once assembly began.
    pub fn next_assembly(&self) -> BTreeSet<MemberId> {
        self.next_view.lock().members.clone()
    }

    fn is_running(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) == RUNNING
    }

    fn transition(&self, event: EarnerEvent) {
        self.earner.fire(event, |effect| self.execute(effect));
    }

    fn execute(&self, effect: EarnerEffect) {
        match effect {
            EarnerEffect::StartProduction => self.start_production(),
            EarnerEffect::Checkpoint => {
                if let Err(err) = self.checkpoint() {
                    error!(member = %self.member, error = %err, "Checkpoint failed");
                    self.transition(EarnerEvent::Failed);
                }
            }
            EarnerEffect::CheckAssembly => {
                if !self.joins.is_empty() {
                    self.transition(EarnerEvent::ViewComplete);
                }
            }
            EarnerEffect::Reconfigure => {
                if let Err(err) = self.reconfigure() {
                    warn!(member = %self.member, error = %err, "Reconfiguration failed");
                    *self.next_view.lock() = NextView::default();
                    self.transition(EarnerEvent::Failed);
                }
            }
            EarnerEffect::Complete | EarnerEffect::Fail => self.stop(),
        }
    }

    fn start_production(&self) {
        debug!(
            member = %self.member,
            view = %self.ports.view.view_id(),
            "Starting production"
        );
        self.ports.controller.start();
        self.ports.coordinator.start();
    }

    fn checkpoint(&self) -> Result<()> {
        let tip = self.tip();
        let body = self
            .ports
            .view
            .checkpoint(&tip)
            .ok_or(ProductionError::MissingCheckpoint {
                member: self.member,
            })?;
        let block = self.install(BlockBody::Checkpoint(body))?;
        info!(
            member = %self.member,
            view = %self.ports.view.view_id(),
            hash = %block.hash,
            height = block.height(),
            "Produced checkpoint"
        );
        self.transition(EarnerEvent::LastBlock);
        Ok(())
    }

    fn reconfigure(&self) -> Result<()> {
        let next_view_id = self.next_view.lock().id.ok_or(ProductionError::NoNextView)?;
        let need = self.config.tolerance_level + 1;
        let have = self.joins.len();
        debug!(
            member = %self.member,
            next_view = %next_view_id,
            joins = have,
            "Attempting reconfiguration"
        );
        if have < need {
            return Err(ProductionError::InsufficientJoins { have, need });
        }

        let mut joins: Vec<JoinRequest> = self.joins.iter().map(|e| e.value().clone()).collect();
        joins.sort_by_key(|join| join.member);

        let tip = self.tip();
        let body = self.ports.view.reconfigure(&joins, next_view_id, &tip);
        let block = self.install(BlockBody::Reconfigure(body))?;
        self.ports.source.validations_only(true);
        info!(
            member = %self.member,
            next_view = %next_view_id,
            hash = %block.hash,
            height = block.height(),
            members = joins.len(),
            "Produced reconfiguration block"
        );
        Ok(())
    }

    fn produce_assemble(&self) -> Result<()> {
        let next_view_id = self.tip().hash;
        let members = view_members_of(
            &next_view_id,
            &self.ports.view.committee(),
            self.config.committee_size(),
        );
        {
            let mut next = self.next_view.lock();
            next.id = Some(next_view_id);
            next.members = members.clone();
        }

        let block = self.install(BlockBody::Assemble {
            next_view: next_view_id,
        })?;
        debug!(
            member = %self.member,
            view = %self.ports.view.view_id(),
            next_view = %next_view_id,
            hash = %block.hash,
            height = block.height(),
            "View assembly"
        );

        let listener: Weak<dyn AssemblyListener> = self.this.clone();
        let assembly = self.ports.assemblies.assemble(next_view_id, members, listener);
        *self.assembly.lock() = Some(Arc::clone(&assembly));
        if self.is_running() {
            assembly.start();
        }
        Ok(())
    }

    /// Append a block with `body` at the tip, self-witness and register it.
    fn install(&self, body: BlockBody) -> Result<Arc<HashedBlock>> {
        let next = {
            let mut tip = self.tip.write();
            let block = Block {
                height: tip.height() + 1,
                previous_hash: tip.hash,
                body,
            };
            let next = Arc::new(HashedBlock::new(block)?);
            *tip = Arc::clone(&next);
            next
        };

        let validation = self.ports.view.generate_validation(&next);
        self.certifier.register((*next).clone(), validation.clone());
        self.ports.source.offer_validation(validation);
        self.metrics.record_block_produced();
        debug!(
            member = %self.member,
            hash = %next.hash,
            height = next.height(),
            kind = next.block.body.kind(),
            "Block created"
        );
        Ok(next)
    }

    fn admit_witnesses(&self, witnesses: Vec<Validate>) {
        let mut touched: Vec<Digest> = Vec::new();
        for witness in witnesses {
            let hash = witness.block_hash;
            match self
                .certifier
                .record(witness, |block, w| self.ports.view.validate(block, w))
            {
                Recorded::Accepted => {
                    self.metrics.record_witness(true);
                    if !touched.contains(&hash) {
                        touched.push(hash);
                    }
                }
                Recorded::Repeated => self.metrics.record_witness_repeat(),
                Recorded::Unknown | Recorded::Rejected => self.metrics.record_witness(false),
            }
        }
        if touched.is_empty() {
            return;
        }

        // Certify under the publication lock so concurrent batches cannot
        // interleave their releases.
        let mut publication = self.publication.lock();
        for hash in &touched {
            if let Some(certified) = self.certifier.try_certify(hash) {
                publication.ready.insert(certified.height(), certified);
            }
        }
        self.release(&mut publication);
    }

    /// Publish every certified block that extends the published chain.
    fn release(&self, publication: &mut Publication) {
        loop {
            let height = publication.next_height;
            let Some(block) = publication.ready.remove(&height) else {
                break;
            };
            publication.next_height = height + 1;
            debug!(
                member = %self.member,
                hash = %block.hash,
                height,
                witnesses = block.certifications.len(),
                "Publishing certified block"
            );
            self.metrics.record_block_certified();
            self.ports.view.publish(block);
        }
        if !publication.ready.is_empty() {
            trace!(
                member = %self.member,
                awaiting = publication.next_height,
                held = publication.ready.len(),
                "Certified blocks held for their parent"
            );
        }
    }
}

impl BlockProducerApi for BlockProducer {
    fn start(&self) {
        if self
            .lifecycle
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let tip = self.tip();
        info!(
            member = %self.member,
            view = %self.ports.view.view_id(),
            height = tip.height(),
            "[producer] Starting"
        );
        if tip.block.requires_checkpoint() {
            self.transition(EarnerEvent::Checkpoint);
        } else {
            self.transition(EarnerEvent::Start);
        }
    }

    fn stop(&self) {
        if self
            .lifecycle
            .compare_exchange(RUNNING, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        info!(
            member = %self.member,
            view = %self.ports.view.view_id(),
            "[producer] Stopping"
        );
        self.ports.controller.stop();
        self.ports.coordinator.stop();
        let assembly = self.assembly.lock().take();
        if let Some(assembly) = assembly {
            assembly.stop();
        }
        let discarded = self.ports.source.close();
        if discarded > 0 {
            warn!(
                member = %self.member,
                discarded,
                "Accepted transactions discarded unsent"
            );
            self.metrics.record_transactions_dropped(discarded as u64);
        }
    }

    fn submit(&self, transaction: Transaction) -> Result<()> {
        let hash = transaction.hash();
        if self.ports.source.offer_transaction(transaction) {
            self.metrics.record_submission(true);
            debug!(member = %self.member, tx = %hash, "Submitted transaction");
            Ok(())
        } else {
            self.metrics.record_submission(false);
            debug!(member = %self.member, tx = %hash, "Transaction buffer full");
            Err(ProductionError::BufferFull {
                member: self.member,
            })
        }
    }

    fn status(&self) -> ProducerStatus {
        let tip = self.tip();
        ProducerStatus {
            state: self.earner.state(),
            running: self.is_running(),
            tip_height: tip.height(),
            tip_hash: tip.hash,
            pending_blocks: self.certifier.pending_count(),
            joins: self.joins.len(),
            next_view_id: self.next_view.lock().id,
        }
    }
}

impl OrderingSink for BlockProducer {
    fn on_pre_block(&self, units: &[Vec<u8>], last: bool) {
        if !self.is_running() {
            trace!(member = %self.member, "Pre-block while not running");
            return;
        }

        let mut transactions = Vec::new();
        let mut witnesses = Vec::new();
        for unit in units {
            match UnitData::decode(unit) {
                Ok(data) => {
                    transactions.extend(data.transactions);
                    witnesses.extend(data.validations);
                }
                Err(err) => {
                    error!(member = %self.member, error = %err, "Error parsing unit data");
                    self.metrics.record_unit_dropped();
                }
            }
        }

        self.admit_witnesses(witnesses);

        if let Err(err) = self.install(BlockBody::Executions(transactions)) {
            error!(member = %self.member, error = %err, "Cannot produce block");
            self.transition(EarnerEvent::Failed);
            return;
        }

        if last {
            self.transition(EarnerEvent::Complete);
        } else if self.countdown.tick() {
            if let Err(err) = self.produce_assemble() {
                error!(member = %self.member, error = %err, "Cannot produce assemble block");
                self.transition(EarnerEvent::Failed);
            }
        }
    }

    fn on_epoch(&self, epoch: u32) {
        if !self.is_running() || !self.epochs.fires_on(epoch) {
            return;
        }
        info!(
            member = %self.member,
            view = %self.ports.view.view_id(),
            epoch,
            "Reconfiguration epoch, validations only"
        );
        self.ports.source.validations_only(true);
        self.transition(EarnerEvent::LastBlock);
    }
}

impl AssemblyListener for BlockProducer {
    fn assembly_complete(&self, slate: Vec<JoinRequest>) {
        let next_view_id = self.next_view.lock().id;
        let mut gathered = 0usize;
        for join in slate {
            if Some(join.view) != next_view_id {
                trace!(member = %self.member, joiner = %join.member, "Stale join request");
                continue;
            }
            self.joins.insert(join.member, join);
            gathered += 1;
        }
        debug!(
            member = %self.member,
            next_view = ?next_view_id,
            gathered,
            "View assembly complete"
        );
        self.transition(EarnerEvent::ViewComplete);
    }

    fn assembly_failed(&self) {
        warn!(member = %self.member, "View assembly failed");
        self.transition(EarnerEvent::Failed);
    }
}
