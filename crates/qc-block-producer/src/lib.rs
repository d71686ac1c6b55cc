//! # Quorum Chain - Block Producer
//!
//! **Bounded Context:** Committee Block Production & View Reconfiguration
//! **Architecture Compliance:** DDD + Hexagonal
//!
//! ## Purpose
//!
//! A committee of `3f + 1` members runs a DAG ordering engine. Every member
//! sees the same totally ordered sequence of pre-blocks. This crate turns
//! that sequence into a hash chain of blocks, each certified by more than
//! `f` witness signatures, and hands the chain over to the next committee:
//!
//! - Block production and quorum certification from ordered pre-blocks
//! - A production state machine (start, checkpoint, reconfigure, complete)
//! - A reconfiguration state machine (gather, nominate, certify, elect)
//! - A countdown that opens assembly of the next committee
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - TxBuffer: unit batching                          │
//! │  - MemoryViewContext: signing, validation, publish  │
//! │  - MemoryAssembly: join gathering                   │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: OrderingSink, BlockProducerApi          │
//! │  - Outbound: ViewContext, UnitSource, assemblies    │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - QuorumCertifier                                  │
//! │  - Earner / Reconfiguration state machines          │
//! │  - ReconfigurationCountdown, EpochTrigger           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **At-most-once**: a block hash is published at most once
//! 2. **Linkage**: every block's `previous_hash` is the hash of the tip before it
//! 3. **Quorum**: publication needs more than `f` distinct committee witnesses
//! 4. **Idempotent lifecycle**: start and stop act once
//!
//! ## Module Structure
//!
//! - [`domain`]: certifier, state machines, countdown
//! - [`ports`]: hexagonal interfaces (inbound/outbound)
//! - [`adapters`]: in-process port implementations
//! - [`service`]: the [`BlockProducer`] wiring it all together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

mod config;
mod error;
mod metrics;

pub use config::{BatchConfig, ProducerConfig};
pub use error::{ProductionError, Result};
pub use metrics::Metrics;

pub use domain::{
    view_members_of, EarnerState, EpochTrigger, HashedBlock, QuorumCertifier,
    ReconfigurationCountdown, ReconfigurationState, Recorded,
};

pub use ports::{
    AssemblyFactory, AssemblyListener, BlockProducerApi, GossipCoordinator, OrderingController,
    OrderingSink, ProducerStatus, UnitSource, ViewAssembly, ViewContext,
};

pub use service::{BlockProducer, ProducerPorts};

/// Ordinary blocks produced before the Assemble block.
pub const DEFAULT_RECONFIGURATION_COUNTDOWN: u32 = 3;
