//! # In-Process Committee
//!
//! Runs every member's producer in one process. [`Committee::round`]
//! stands in for the ordering engine: it pulls one unit from every
//! member's buffer and delivers the same pre-block, in the same order,
//! to all of them.

use qc_block_producer::adapters::{
    member_id, sign_join, MemoryAssembly, MemoryAssemblyFactory, MemoryViewContext, TxBuffer,
};
use qc_block_producer::{
    BlockProducer, BlockProducerApi, GossipCoordinator, HashedBlock, OrderingController,
    OrderingSink, ProducerConfig, ProducerPorts, Result, ViewContext,
};
use shared_crypto::{blake3_hash, Ed25519KeyPair};
use shared_types::{Block, BlockBody, CertifiedBlock, Digest, MemberId, Reconfigure, Transaction};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Deterministic key pair for `seed`.
pub fn keypair(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

/// Ordering engine and gossip stand-in that counts lifecycle calls.
#[derive(Debug, Default)]
pub struct Engine {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl Engine {
    /// Number of start calls.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of stop calls.
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl OrderingController for Engine {
    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

impl GossipCoordinator for Engine {
    fn start(&self) {}
    fn stop(&self) {}
}

/// One committee member and its collaborators.
pub struct Member {
    /// View context
    pub view: Arc<MemoryViewContext>,
    /// Outbound buffer
    pub buffer: Arc<TxBuffer>,
    /// Ordering engine stand-in
    pub engine: Arc<Engine>,
    /// Assembly factory
    pub assemblies: Arc<MemoryAssemblyFactory>,
    /// The producer
    pub producer: Arc<BlockProducer>,
}

impl Member {
    /// Committee identity.
    pub fn id(&self) -> MemberId {
        self.view.member()
    }

    /// The assembly this member opened for `next_view`.
    pub fn assembly(&self, next_view: &Digest) -> Option<Arc<MemoryAssembly>> {
        self.assemblies.assembly(next_view)
    }
}

/// A whole committee serving one view.
pub struct Committee {
    /// Id of the view being served
    pub view_id: Digest,
    /// Block every member continues from
    pub genesis: HashedBlock,
    /// Members, in seed order
    pub members: Vec<Member>,
}

impl Committee {
    /// Build a committee with one member per seed.
    pub fn new(config: ProducerConfig, seeds: &[u8]) -> Result<Self> {
        let view_id = Digest(blake3_hash(seeds));
        let roster: Vec<MemberId> = seeds.iter().map(|&seed| member_id(&keypair(seed))).collect();
        let genesis = HashedBlock::new(Block {
            height: 0,
            previous_hash: Digest::ZERO,
            body: BlockBody::Genesis(Reconfigure {
                id: view_id,
                members: seeds.iter().map(|&seed| sign_join(&keypair(seed), view_id)).collect(),
                checkpoint_target: 10,
            }),
        })?;

        let mut members = Vec::with_capacity(seeds.len());
        for &seed in seeds {
            let view = Arc::new(
                MemoryViewContext::new(view_id, keypair(seed), roster.iter().copied())
                    .with_checkpoint_target(10),
            );
            let buffer = Arc::new(TxBuffer::new(
                view.member(),
                config.batch.clone(),
                config.max_elements(),
            ));
            let engine = Arc::new(Engine::default());
            let assemblies = Arc::new(MemoryAssemblyFactory::new(config.tolerance_level));
            let producer = BlockProducer::new(
                config.clone(),
                genesis.clone(),
                ProducerPorts {
                    view: view.clone(),
                    source: buffer.clone(),
                    controller: engine.clone(),
                    coordinator: engine.clone(),
                    assemblies: assemblies.clone(),
                },
            )?;
            members.push(Member {
                view,
                buffer,
                engine,
                assemblies,
                producer,
            });
        }

        Ok(Self {
            view_id,
            genesis,
            members,
        })
    }

    /// Start every producer.
    pub fn start(&self) {
        for member in &self.members {
            member.producer.start();
        }
    }

    /// One ordering round.
    pub fn round(&self, last: bool) {
        let units: Vec<Vec<u8>> = self
            .members
            .iter()
            .filter_map(|member| member.buffer.next_unit().ok().flatten())
            .collect();
        for member in &self.members {
            member.producer.on_pre_block(&units, last);
        }
    }

    /// Signal an epoch boundary to every member.
    pub fn epoch(&self, epoch: u32) {
        for member in &self.members {
            member.producer.on_epoch(epoch);
        }
    }

    /// Submit `transaction` through member `index`.
    pub fn submit(&self, index: usize, transaction: Transaction) -> Result<()> {
        self.members[index].producer.submit(transaction)
    }

    /// Next view id as seen by the first member.
    pub fn next_view(&self) -> Option<Digest> {
        self.members.first().and_then(|m| m.producer.status().next_view_id)
    }

    /// Deliver a join request from each of `seeds` to every member's
    /// assembly. Returns the number of accepted offers.
    pub fn join(&self, seeds: &[u8]) -> usize {
        let Some(next_view) = self.next_view() else {
            return 0;
        };
        let mut accepted = 0;
        for member in &self.members {
            let Some(assembly) = member.assembly(&next_view) else {
                continue;
            };
            for &seed in seeds {
                if assembly.offer_join(sign_join(&keypair(seed), next_view)) {
                    accepted += 1;
                }
            }
        }
        accepted
    }

    /// Force election with the joins gathered so far.
    pub fn elect(&self) {
        let Some(next_view) = self.next_view() else {
            return;
        };
        for member in &self.members {
            if let Some(assembly) = member.assembly(&next_view) {
                assembly.elect_now();
            }
        }
    }

    /// The common tip, if every member agrees on it.
    pub fn tip(&self) -> Option<Arc<HashedBlock>> {
        let first = self.members.first()?.producer.tip();
        self.members
            .iter()
            .all(|m| m.producer.tip().hash == first.hash)
            .then_some(first)
    }

    /// Blocks published by member `index`.
    pub fn published(&self, index: usize) -> Vec<CertifiedBlock> {
        self.members[index].view.published()
    }
}
