//! # Committee-Reconfiguration State Machine
//!
//! ```text
//! [AWAIT_ASSEMBLY] ──assembled──→ [GATHER] ──gathered──→ [NOMINATION] ──nominated──→ [CERTIFICATION]
//!                                    │                                                  │   ↺ gathered, validation
//!                                    └──election──────────→ [RECONFIGURE] ←──certified, election
//!                                                                │
//!                                                            complete
//!                                                                ↓
//!                                                          [RECONFIGURED]
//!
//!   any state ──failed──→ [PROTOCOL_FAILURE]
//! ```
//!
//! Entering a state runs its leaf action: GATHER `gather`, NOMINATION
//! `nominate`, CERTIFICATION `certify`, RECONFIGURE `elect`, RECONFIGURED
//! `complete`, PROTOCOL_FAILURE `failed`.
//!
//! Unless a state says otherwise: `complete` skips ahead to RECONFIGURE,
//! `election`, `gathered` and `validation` are ignored, and `assembled`,
//! `nominated` and `certified` are protocol violations.

use super::fsm::{Driver, InvalidTransition, StateMachine};

/// Reconfiguration state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReconfigurationState {
    /// Waiting for the assembly to begin
    #[default]
    AwaitAssembly,
    /// Collecting join requests
    Gather,
    /// Proposing the next committee
    Nomination,
    /// Collecting endorsements of the nomination
    Certification,
    /// Locking in the next committee
    Reconfigure,
    /// Done; success reported
    Reconfigured,
    /// Failed; failure reported
    ProtocolFailure,
}

/// Reconfiguration trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconfigurationEvent {
    /// The assembly started
    Assembled,
    /// Enough candidates were gathered (or late ones arrived)
    Gathered,
    /// Nomination accepted locally
    Nominated,
    /// Nomination endorsed by a quorum
    Certified,
    /// Skip ahead to electing with what is known
    Election,
    /// Late witness data
    Validation,
    /// The next committee is final
    Complete,
    /// Abort
    Failed,
}

/// Leaf action requested by a reconfiguration transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconfigurationEffect {
    /// Request candidates
    Gather,
    /// Propose the next committee
    Nominate,
    /// Collect endorsements
    Certify,
    /// Lock in the next committee
    Elect,
    /// Report success
    Complete,
    /// Report failure
    Failed,
}

/// Reconfiguration transition table
#[derive(Debug)]
pub struct Reconfiguration;

impl StateMachine for Reconfiguration {
    type State = ReconfigurationState;
    type Event = ReconfigurationEvent;
    type Effect = ReconfigurationEffect;

    const NAME: &'static str = "reconfiguration";

    fn transition(
        state: ReconfigurationState,
        event: ReconfigurationEvent,
    ) -> Result<(ReconfigurationState, Vec<ReconfigurationEffect>), InvalidTransition> {
        use ReconfigurationEffect as Fx;
        use ReconfigurationEvent as Ev;
        use ReconfigurationState as St;

        let next = match (state, event) {
            (St::ProtocolFailure, _) => (state, vec![]),
            (_, Ev::Failed) => (St::ProtocolFailure, vec![Fx::Failed]),

            (St::AwaitAssembly, Ev::Assembled) => (St::Gather, vec![Fx::Gather]),

            (St::Gather, Ev::Gathered) => (St::Nomination, vec![Fx::Nominate]),
            (St::Gather, Ev::Election) => (St::Reconfigure, vec![Fx::Elect]),

            (St::Nomination, Ev::Nominated) => (St::Certification, vec![Fx::Certify]),

            (St::Certification, Ev::Certified | Ev::Election) => (St::Reconfigure, vec![Fx::Elect]),

            (St::Reconfigure, Ev::Complete) => (St::Reconfigured, vec![Fx::Complete]),
            (St::Reconfigured, Ev::Complete) => (state, vec![]),

            (_, Ev::Complete) => (St::Reconfigure, vec![Fx::Elect]),
            (_, Ev::Election | Ev::Gathered | Ev::Validation) => (state, vec![]),

            (state, event) => return Err(InvalidTransition::new(Self::NAME, state, event)),
        };
        Ok(next)
    }
}

/// Leaf actions of a reconfiguration, supplied by the assembly running it.
pub trait ReconfigurationActions {
    /// Request member candidates.
    fn gather(&self);
    /// Propose the next committee.
    fn nominate(&self);
    /// Collect endorsements of the nomination.
    fn certify(&self);
    /// Lock in the next committee.
    fn elect(&self);
    /// Report the completed committee.
    fn complete(&self);
    /// Report failure.
    fn failed(&self);
}

/// A reconfiguration run: the state machine plus its driver.
pub struct ViewReconfiguration {
    driver: Driver<Reconfiguration>,
}

impl ViewReconfiguration {
    /// Create a run awaiting assembly.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            driver: Driver::new(name, ReconfigurationState::AwaitAssembly),
        }
    }

    /// Current state.
    pub fn state(&self) -> ReconfigurationState {
        self.driver.state()
    }

    /// Fire `event`, dispatching leaf actions to `actions`.
    pub fn fire(&self, event: ReconfigurationEvent, actions: &dyn ReconfigurationActions) {
        self.driver.fire(event, |effect| match effect {
            ReconfigurationEffect::Gather => actions.gather(),
            ReconfigurationEffect::Nominate => actions.nominate(),
            ReconfigurationEffect::Certify => actions.certify(),
            ReconfigurationEffect::Elect => actions.elect(),
            ReconfigurationEffect::Complete => actions.complete(),
            ReconfigurationEffect::Failed => actions.failed(),
        });
    }
}
