//! Whole-committee integration tests.

pub mod committee;
mod flows;

pub use committee::{Committee, Member};
