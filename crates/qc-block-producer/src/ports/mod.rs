//! Ports: the producer's seams.
//!
//! - [`inbound`]: what the ordering engine and the host call
//! - [`outbound`]: the view context, unit source, engine controls and
//!   committee assembly the producer drives

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
