//! # Block-Production State Machine ("Earner")
//!
//! ```text
//! [INITIAL] ──start──→ [PRODUCING] ──lastBlock──→ [RECONFIGURING] ──viewComplete──→ [VIEW_COMPLETE]
//!     │                     ↑                            │                                 │
//!     └──checkpoint──→ [CHECKPOINTING] ──lastBlock───────┘                                 │
//!                                                                                          │
//!   any producing state ──complete──→ [COMPLETE]  ←────────────────────────────────────────┘
//!   any non-terminal    ──failed────→ [FAILED]
//! ```
//!
//! Terminal states absorb every event; callbacks racing with shutdown
//! are expected.

use super::fsm::{InvalidTransition, StateMachine};

/// Earner state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EarnerState {
    /// Constructed, not started
    #[default]
    Initial,
    /// Steady-state production
    Producing,
    /// Opening the view with a checkpoint block
    Checkpointing,
    /// No more ordinary transactions; waiting for the next committee
    Reconfiguring,
    /// Next committee known; reconfiguration block produced
    ViewComplete,
    /// Final block produced, producer stopped
    Complete,
    /// Fatal fault, producer stopped
    Failed,
}

impl EarnerState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EarnerState::Complete | EarnerState::Failed)
    }
}

/// Earner trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EarnerEvent {
    /// Begin normal production
    Start,
    /// Begin by producing a checkpoint
    Checkpoint,
    /// The view accepts no further ordinary transactions
    LastBlock,
    /// Join candidates for the next view are available
    ViewComplete,
    /// The final block of the view was produced
    Complete,
    /// Fatal local fault
    Failed,
}

/// Leaf action requested by an Earner transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EarnerEffect {
    /// Start the ordering controller and gossip coordinator
    StartProduction,
    /// Produce the checkpoint block
    Checkpoint,
    /// Fire `ViewComplete` if join candidates are present
    CheckAssembly,
    /// Produce the reconfiguration block
    Reconfigure,
    /// Stop after success
    Complete,
    /// Stop after a fault
    Fail,
}

/// Earner transition table
#[derive(Debug)]
pub struct Earner;

impl StateMachine for Earner {
    type State = EarnerState;
    type Event = EarnerEvent;
    type Effect = EarnerEffect;

    const NAME: &'static str = "earner";

    fn transition(
        state: EarnerState,
        event: EarnerEvent,
    ) -> Result<(EarnerState, Vec<EarnerEffect>), InvalidTransition> {
        use EarnerEffect as Fx;
        use EarnerEvent as Ev;
        use EarnerState as St;

        let next = match (state, event) {
            (St::Complete | St::Failed, _) => (state, vec![]),

            (_, Ev::Failed) => (St::Failed, vec![Fx::Fail]),

            (St::Initial, Ev::Start) => (St::Producing, vec![Fx::StartProduction]),
            (St::Initial, Ev::Checkpoint) => {
                (St::Checkpointing, vec![Fx::StartProduction, Fx::Checkpoint])
            }

            (St::Producing | St::Checkpointing, Ev::LastBlock) => {
                (St::Reconfiguring, vec![Fx::CheckAssembly])
            }
            // Assembly finished early; picked up by CheckAssembly on LastBlock.
            (St::Producing | St::Checkpointing, Ev::ViewComplete) => (state, vec![]),

            (St::Reconfiguring, Ev::ViewComplete) => (St::ViewComplete, vec![Fx::Reconfigure]),
            (St::Reconfiguring | St::ViewComplete, Ev::LastBlock | Ev::ViewComplete) => {
                (state, vec![])
            }

            (
                St::Producing | St::Checkpointing | St::Reconfiguring | St::ViewComplete,
                Ev::Complete,
            ) => (St::Complete, vec![Fx::Complete]),

            (state, event) => return Err(InvalidTransition::new(Self::NAME, state, event)),
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(state: EarnerState, event: EarnerEvent) -> (EarnerState, Vec<EarnerEffect>) {
        Earner::transition(state, event).unwrap()
    }

    #[test]
    fn test_normal_lifecycle() {
        let (s, fx) = step(EarnerState::Initial, EarnerEvent::Start);
        assert_eq!(s, EarnerState::Producing);
        assert_eq!(fx, vec![EarnerEffect::StartProduction]);

        let (s, fx) = step(s, EarnerEvent::LastBlock);
        assert_eq!(s, EarnerState::Reconfiguring);
        assert_eq!(fx, vec![EarnerEffect::CheckAssembly]);

        let (s, fx) = step(s, EarnerEvent::ViewComplete);
        assert_eq!(s, EarnerState::ViewComplete);
        assert_eq!(fx, vec![EarnerEffect::Reconfigure]);

        let (s, fx) = step(s, EarnerEvent::Complete);
        assert_eq!(s, EarnerState::Complete);
        assert_eq!(fx, vec![EarnerEffect::Complete]);
        assert!(s.is_terminal());
    }

    #[test]
    fn test_checkpoint_start() {
        let (s, fx) = step(EarnerState::Initial, EarnerEvent::Checkpoint);
        assert_eq!(s, EarnerState::Checkpointing);
        assert_eq!(fx, vec![EarnerEffect::StartProduction, EarnerEffect::Checkpoint]);

        let (s, _) = step(s, EarnerEvent::LastBlock);
        assert_eq!(s, EarnerState::Reconfiguring);
    }

    #[test]
    fn test_early_view_complete_is_deferred() {
        let (s, fx) = step(EarnerState::Producing, EarnerEvent::ViewComplete);
        assert_eq!(s, EarnerState::Producing);
        assert!(fx.is_empty());
    }

    #[test]
    fn test_failed_from_every_live_state() {
        for state in [
            EarnerState::Initial,
            EarnerState::Producing,
            EarnerState::Checkpointing,
            EarnerState::Reconfiguring,
            EarnerState::ViewComplete,
        ] {
            let (s, fx) = step(state, EarnerEvent::Failed);
            assert_eq!(s, EarnerState::Failed);
            assert_eq!(fx, vec![EarnerEffect::Fail]);
        }
    }

    #[test]
    fn test_terminal_states_absorb() {
        for event in [EarnerEvent::Start, EarnerEvent::Complete, EarnerEvent::Failed] {
            assert_eq!(step(EarnerState::Failed, event), (EarnerState::Failed, vec![]));
            assert_eq!(step(EarnerState::Complete, event), (EarnerState::Complete, vec![]));
        }
    }

    #[test]
    fn test_protocol_violations() {
        assert!(Earner::transition(EarnerState::Producing, EarnerEvent::Start).is_err());
        assert!(Earner::transition(EarnerState::Producing, EarnerEvent::Checkpoint).is_err());
        assert!(Earner::transition(EarnerState::Initial, EarnerEvent::LastBlock).is_err());
        assert!(Earner::transition(EarnerState::Initial, EarnerEvent::Complete).is_err());
        assert!(Earner::transition(EarnerState::ViewComplete, EarnerEvent::Start).is_err());
    }
}
