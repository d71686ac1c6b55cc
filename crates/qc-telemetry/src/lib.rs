//! # Quorum-Chain Telemetry
//!
//! Structured logging for committee members. Components log through
//! `tracing` with structured fields; this crate installs the global
//! subscriber once per process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_tracing(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `quorum-chain` | Service name in log records |
//! | `QC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `QC_CONSOLE_OUTPUT` | `true` | Emit to stdout |
//! | `QC_JSON_LOGS` | `false` (`true` in containers) | JSON formatted records |

#![warn(missing_docs)]

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The subscriber could not be installed (usually: already installed).
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// The log level directive did not parse.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
