//! Domain layer: pure producer logic.
//!
//! - [`certifier`]: pending-block table and quorum gate
//! - [`earner`]: block-production state machine
//! - [`reconfiguration`]: committee-reconfiguration state machine
//! - [`fsm`]: shared reentrant driver
//! - [`countdown`]: assembly countdown and epoch trigger
//! - [`committee`]: deterministic committee selection

pub mod certifier;
pub mod committee;
pub mod countdown;
pub mod earner;
pub mod entities;
pub mod fsm;
pub mod reconfiguration;

pub use certifier::{QuorumCertifier, Recorded};
pub use committee::view_members_of;
pub use countdown::{EpochTrigger, ReconfigurationCountdown};
pub use earner::{Earner, EarnerEffect, EarnerEvent, EarnerState};
pub use entities::{HashedBlock, PendingBlock};
pub use fsm::{Driver, InvalidTransition, StateMachine};
pub use reconfiguration::{
    Reconfiguration, ReconfigurationActions, ReconfigurationEffect, ReconfigurationEvent,
    ReconfigurationState, ViewReconfiguration,
};
