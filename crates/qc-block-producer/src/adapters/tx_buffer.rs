//! # Outbound Transaction Buffer
//!
//! Bounded staging area between client submissions and the ordering
//! engine. The engine pulls one encoded [`UnitData`] per round with
//! [`TxBuffer::next_unit`].
//!
//! - Transactions are bounded by total bytes; a full buffer refuses the
//!   offer instead of blocking.
//! - Witnesses are never refused while open; they are packed ahead of
//!   transactions.
//! - In validations-only mode new transactions are refused. Those
//!   already queued are still packed, so an accepted submission is not
//!   lost at the switch.
//! - Closing discards what is left and reports how many transactions
//!   went with it.

use crate::config::BatchConfig;
use crate::ports::UnitSource;
use parking_lot::Mutex;
use shared_types::{CodecError, MemberId, Transaction, UnitData, Validate};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Approximate encoded size of one witness.
const VALIDATION_BYTES: usize = 32 + 32 + 64;

#[derive(Debug, Default)]
struct BufferState {
    transactions: VecDeque<Transaction>,
    validations: VecDeque<Validate>,
    buffered_bytes: usize,
    validations_only: bool,
    closed: bool,
    units_emitted: usize,
}

/// Bounded outbound unit buffer.
#[derive(Debug)]
pub struct TxBuffer {
    member: MemberId,
    limits: BatchConfig,
    max_elements: usize,
    state: Mutex<BufferState>,
}

impl TxBuffer {
    /// Create a buffer feeding at most `max_elements` units.
    pub fn new(member: MemberId, limits: BatchConfig, max_elements: usize) -> Self {
        Self {
            member,
            limits,
            max_elements,
            state: Mutex::new(BufferState::default()),
        }
    }

    /// Pack the next unit for the ordering engine.
    ///
    /// Returns `Ok(None)` once closed or after `max_elements` units.
    pub fn next_unit(&self) -> Result<Option<Vec<u8>>, CodecError> {
        let unit = {
            let mut state = self.state.lock();
            if state.closed || state.units_emitted >= self.max_elements {
                return Ok(None);
            }
            state.units_emitted += 1;
            self.pack(&mut state)
        };
        trace!(
            member = %self.member,
            transactions = unit.transactions.len(),
            validations = unit.validations.len(),
            "Packed unit"
        );
        unit.encode().map(Some)
    }

    fn pack(&self, state: &mut BufferState) -> UnitData {
        let mut unit = UnitData::default();
        let mut bytes = 0usize;
        let mut count = 0usize;

        while count < self.limits.max_batch_count && bytes + VALIDATION_BYTES <= self.limits.max_batch_bytes {
            let Some(validation) = state.validations.pop_front() else {
                break;
            };
            unit.validations.push(validation);
            bytes += VALIDATION_BYTES;
            count += 1;
        }

        while count < self.limits.max_batch_count {
            let Some(size) = state.transactions.front().map(Transaction::byte_size) else {
                break;
            };
            // An oversized transaction still goes out alone.
            if count > 0 && bytes + size > self.limits.max_batch_bytes {
                break;
            }
            let Some(tx) = state.transactions.pop_front() else {
                break;
            };
            state.buffered_bytes -= size;
            unit.transactions.push(tx);
            bytes += size;
            count += 1;
        }
        unit
    }

    /// Transactions waiting to be packed.
    pub fn queued_transactions(&self) -> usize {
        self.state.lock().transactions.len()
    }

    /// Witnesses waiting to be packed.
    pub fn queued_validations(&self) -> usize {
        self.state.lock().validations.len()
    }

    /// Bytes of queued transactions.
    pub fn buffered_bytes(&self) -> usize {
        self.state.lock().buffered_bytes
    }

    /// Whether new transactions are refused.
    pub fn is_validations_only(&self) -> bool {
        self.state.lock().validations_only
    }

    /// Whether the buffer is closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl UnitSource for TxBuffer {
    fn offer_transaction(&self, transaction: Transaction) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.validations_only {
            return false;
        }
        let size = transaction.byte_size();
        if state.buffered_bytes + size > self.limits.max_buffer_bytes {
            return false;
        }
        state.buffered_bytes += size;
        state.transactions.push_back(transaction);
        true
    }

    fn offer_validation(&self, validation: Validate) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.validations.push_back(validation);
    }

    fn validations_only(&self, enabled: bool) {
        let mut state = self.state.lock();
        if state.validations_only != enabled {
            debug!(member = %self.member, enabled, "Validations only");
        }
        state.validations_only = enabled;
    }

    fn close(&self) -> usize {
        let mut state = self.state.lock();
        if state.closed {
            return 0;
        }
        let discarded = state.transactions.len();
        debug!(member = %self.member, discarded, "Closing transaction buffer");
        state.closed = true;
        state.transactions.clear();
        state.validations.clear();
        state.buffered_bytes = 0;
        discarded
    }
}
