//! # Unit Payload Codec
//!
//! The ordering substrate carries opaque byte payloads. Each payload a
//! member contributes is an encoded [`UnitData`]: a batch of client
//! transactions plus the member's pending block validations.

use crate::entities::{Transaction, Validate};
use crate::errors::CodecError;
use serde::{Deserialize, Serialize};

/// Contents of one unit contributed to the ordering substrate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Client transactions, in submission order.
    pub transactions: Vec<Transaction>,
    /// Witness signatures over produced blocks.
    pub validations: Vec<Validate>,
}

impl UnitData {
    /// True if the unit carries nothing.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.validations.is_empty()
    }

    /// Encode for the ordering substrate.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Decode a payload delivered by the ordering substrate.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
