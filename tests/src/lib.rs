//! # Quorum-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Whole-committee simulations
//!     ├── committee.rs  # In-process committee and ordering rounds
//!     └── flows.rs      # Production, epoch and hand-off scenarios
//!
//! tests/benches/
//! └── producer_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod integration;
