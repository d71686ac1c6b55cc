//! # Shared Types Crate
//!
//! This crate contains the chain entities exchanged between the block
//! producer, the view context that persists the chain, and the ordering
//! substrate that circulates opaque units between committee members.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary is
//!   defined here.
//! - **Opaque Units**: the ordering engine only ever sees encoded
//!   [`UnitData`]; decoding is the consumer's job and must be defensive.
//! - **Immutable Entities**: blocks, witnesses and certificates are values;
//!   aggregation state lives in the producer, not here.

pub mod codec;
pub mod entities;
pub mod errors;

pub use codec::UnitData;
pub use entities::*;
pub use errors::*;
