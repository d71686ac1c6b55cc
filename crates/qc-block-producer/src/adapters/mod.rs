//! Adapters: in-process implementations of the outbound ports.
//!
//! - [`tx_buffer`]: batches transactions and validations into units
//! - [`memory_view`]: a view context backed by memory and Ed25519 keys
//! - [`assembly`]: committee assembly over signed join requests

pub mod assembly;
pub mod memory_view;
pub mod tx_buffer;

pub use assembly::{MemoryAssembly, MemoryAssemblyFactory};
pub use memory_view::{member_id, sign_join, sign_validation, verify_member_signature, MemoryViewContext};
pub use tx_buffer::TxBuffer;
