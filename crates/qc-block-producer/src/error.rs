//! Error types for the block producer

use shared_types::{CodecError, MemberId};
use thiserror::Error;

/// Result type alias for producer operations
pub type Result<T> = std::result::Result<T, ProductionError>;

/// Errors that can occur during block production
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductionError {
    /// Outbound transaction buffer is full (or no longer accepting)
    #[error("Transaction buffer full on: {member}")]
    BufferFull {
        /// Identity of the local member
        member: MemberId,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Block or unit encoding failed
    #[error("Codec error: {0}")]
    Codec(String),

    /// View context could not produce a checkpoint body
    #[error("Cannot generate checkpoint block on: {member}")]
    MissingCheckpoint {
        /// Identity of the local member
        member: MemberId,
    },

    /// Not enough join requests to reconfigure
    #[error("Insufficient joins: have {have}, need {need}")]
    InsufficientJoins {
        /// Joins gathered
        have: usize,
        /// Joins required (f + 1)
        need: usize,
    },

    /// Reconfiguration requested before any next view was assembled
    #[error("No next view assembled")]
    NoNextView,
}

impl ProductionError {
    /// Check if the caller may retry the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProductionError::BufferFull { .. })
    }

    /// Check if the error ends production of the current view
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            ProductionError::MissingCheckpoint { .. }
                | ProductionError::InsufficientJoins { .. }
                | ProductionError::NoNextView
                | ProductionError::Codec(_)
        )
    }
}

impl From<CodecError> for ProductionError {
    fn from(err: CodecError) -> Self {
        ProductionError::Codec(err.to_string())
    }
}
