//! Metrics collection for the block producer

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for one producer
#[derive(Debug, Default)]
pub struct Metrics {
    /// Blocks installed at the tip
    pub blocks_produced: AtomicU64,

    /// Blocks handed to the view context for publication
    pub blocks_certified: AtomicU64,

    /// Witnesses recorded against a pending block
    pub witnesses_accepted: AtomicU64,

    /// Witnesses for unknown blocks or failing validation
    pub witnesses_ignored: AtomicU64,

    /// Witnesses from a member already counted for that block
    pub witnesses_repeated: AtomicU64,

    /// Ordering units that failed to decode
    pub units_dropped: AtomicU64,

    /// Transactions accepted by the outbound buffer
    pub transactions_submitted: AtomicU64,

    /// Transactions rejected as buffer-full
    pub submissions_rejected: AtomicU64,

    /// Accepted transactions discarded unsent when the buffer closed
    pub transactions_dropped: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block installed at the tip
    pub fn record_block_produced(&self) {
        self.blocks_produced.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a certified block
    pub fn record_block_certified(&self) {
        self.blocks_certified.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a witness outcome
    pub fn record_witness(&self, accepted: bool) {
        if accepted {
            self.witnesses_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.witnesses_ignored.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a repeated witness
    pub fn record_witness_repeat(&self) {
        self.witnesses_repeated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record accepted transactions that were never sent
    pub fn record_transactions_dropped(&self, count: u64) {
        self.transactions_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a unit that failed to decode
    pub fn record_unit_dropped(&self) {
        self.units_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submission outcome
    pub fn record_submission(&self, accepted: bool) {
        if accepted {
            self.transactions_submitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.submissions_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get blocks produced
    pub fn get_blocks_produced(&self) -> u64 {
        self.blocks_produced.load(Ordering::Relaxed)
    }

    /// Get blocks certified
    pub fn get_blocks_certified(&self) -> u64 {
        self.blocks_certified.load(Ordering::Relaxed)
    }

    /// Get witnesses accepted
    pub fn get_witnesses_accepted(&self) -> u64 {
        self.witnesses_accepted.load(Ordering::Relaxed)
    }

    /// Get witnesses ignored
    pub fn get_witnesses_ignored(&self) -> u64 {
        self.witnesses_ignored.load(Ordering::Relaxed)
    }

    /// Get witnesses repeated
    pub fn get_witnesses_repeated(&self) -> u64 {
        self.witnesses_repeated.load(Ordering::Relaxed)
    }

    /// Get transactions dropped
    pub fn get_transactions_dropped(&self) -> u64 {
        self.transactions_dropped.load(Ordering::Relaxed)
    }

    /// Get units dropped
    pub fn get_units_dropped(&self) -> u64 {
        self.units_dropped.load(Ordering::Relaxed)
    }

    /// Get submissions rejected
    pub fn get_submissions_rejected(&self) -> u64 {
        self.submissions_rejected.load(Ordering::Relaxed)
    }

    /// Fraction of produced blocks that reached a quorum
    pub fn get_certification_ratio(&self) -> f64 {
        let produced = self.blocks_produced.load(Ordering::Relaxed);
        if produced == 0 {
            return 0.0;
        }
        self.blocks_certified.load(Ordering::Relaxed) as f64 / produced as f64
    }
}
