//! Configuration types for the block producer

use crate::error::{ProductionError, Result};
use serde::Deserialize;

/// Rounds at the end of each epoch the ordering engine reserves for itself.
const RESERVED_ROUNDS_PER_EPOCH: u32 = 7;

/// Runtime configuration for one producer (one view)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Maximum number of faulty members tolerated (`f`)
    pub tolerance_level: usize,

    /// Ordinary blocks produced before the Assemble block
    pub reconfiguration_countdown: u32,

    /// Ordering-engine rounds per epoch
    pub epoch_length: u32,

    /// Epochs per view
    pub number_of_epochs: u32,

    /// Size of the prospective next committee (default: 3f + 1)
    pub committee_size: Option<usize>,

    /// Outbound batching limits
    pub batch: BatchConfig,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            tolerance_level: 1,
            reconfiguration_countdown: crate::DEFAULT_RECONFIGURATION_COUNTDOWN,
            epoch_length: 30,
            number_of_epochs: 3,
            committee_size: None,
            batch: BatchConfig::default(),
        }
    }
}

impl ProducerConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.epoch_length <= RESERVED_ROUNDS_PER_EPOCH {
            return Err(ProductionError::InvalidConfig(format!(
                "epoch_length must exceed {}, got {}",
                RESERVED_ROUNDS_PER_EPOCH, self.epoch_length
            )));
        }
        if self.number_of_epochs < 2 {
            return Err(ProductionError::InvalidConfig(format!(
                "number_of_epochs must be at least 2, got {}",
                self.number_of_epochs
            )));
        }
        if self.reconfiguration_countdown == 0 {
            return Err(ProductionError::InvalidConfig(
                "reconfiguration_countdown must be positive".into(),
            ));
        }
        self.batch.validate()?;

        let quorum = self.tolerance_level + 1;
        if self.committee_size() < quorum {
            return Err(ProductionError::InvalidConfig(format!(
                "committee_size {} below quorum {}",
                self.committee_size(),
                quorum
            )));
        }
        Ok(())
    }

    /// Number of rounds the data source may feed during one view.
    pub fn max_elements(&self) -> usize {
        let rounds = self.epoch_length.saturating_sub(RESERVED_ROUNDS_PER_EPOCH) as usize;
        rounds * self.number_of_epochs.saturating_sub(1) as usize
    }

    /// Epoch at which the view stops accepting ordinary transactions.
    pub fn reconfiguration_epoch(&self) -> u32 {
        self.number_of_epochs.saturating_sub(1)
    }

    /// Size of the next committee.
    pub fn committee_size(&self) -> usize {
        self.committee_size
            .unwrap_or(3 * self.tolerance_level + 1)
    }
}

/// Outbound batching limits
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Byte budget of one unit (default: 256 KiB)
    pub max_batch_bytes: usize,

    /// Element budget of one unit (default: 10000)
    pub max_batch_count: usize,

    /// Transaction buffer capacity in bytes (default: 10 MiB)
    pub max_buffer_bytes: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_bytes: 256 * 1024,
            max_batch_count: 10_000,
            max_buffer_bytes: 10 * 1024 * 1024,
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> Result<()> {
        if self.max_batch_bytes == 0 || self.max_batch_count == 0 || self.max_buffer_bytes == 0 {
            return Err(ProductionError::InvalidConfig(
                "batch limits must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProducerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.committee_size(), 4);
        assert_eq!(config.reconfiguration_epoch(), 2);
        assert_eq!(config.max_elements(), (30 - 7) * 2);
    }

    #[test]
    fn test_short_epoch_rejected() {
        let config = ProducerConfig {
            epoch_length: 7,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ProductionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_epoch_rejected() {
        let config = ProducerConfig {
            number_of_epochs: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_committee_below_quorum_rejected() {
        let config = ProducerConfig {
            tolerance_level: 2,
            committee_size: Some(2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_limit_rejected() {
        let mut config = ProducerConfig::default();
        config.batch.max_batch_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ProducerConfig =
            serde_json::from_str(r#"{"tolerance_level": 2, "batch": {"max_batch_count": 5}}"#)
                .unwrap();
        assert_eq!(config.tolerance_level, 2);
        assert_eq!(config.committee_size(), 7);
        assert_eq!(config.batch.max_batch_count, 5);
        assert_eq!(config.batch.max_batch_bytes, 256 * 1024);
        assert_eq!(config.epoch_length, 30);
    }
}
