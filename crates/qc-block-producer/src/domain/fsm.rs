//! # Finite State Machine Driver
//!
//! State machines in this crate are pure transition tables:
//! `(State, Event) -> (State, Vec<Effect>)`. The [`Driver`] owns the
//! current state and hands effects to an executor.
//!
//! Executors may fire further events while handling an effect. Such
//! events are queued and run after the current transition's effects, in
//! FIFO order, by the call that is already draining the queue. The same
//! holds for events fired concurrently from other threads.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use thiserror::Error;

/// A trigger the current state does not define.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{machine}: invalid transition {event} in state {state}")]
pub struct InvalidTransition {
    /// Machine name
    pub machine: &'static str,
    /// State at the time of the event
    pub state: String,
    /// The rejected event
    pub event: String,
}

impl InvalidTransition {
    /// Build from the offending state and event.
    pub fn new(machine: &'static str, state: impl Debug, event: impl Debug) -> Self {
        Self {
            machine,
            state: format!("{:?}", state),
            event: format!("{:?}", event),
        }
    }
}

/// A pure transition table.
pub trait StateMachine {
    /// Machine state
    type State: Copy + Debug + Eq + Send;
    /// Trigger
    type Event: Copy + Debug + Send;
    /// Leaf action requested by a transition
    type Effect: Debug;

    /// Name used in logs and errors.
    const NAME: &'static str;

    /// Compute the next state and the leaf actions to run.
    fn transition(
        state: Self::State,
        event: Self::Event,
    ) -> Result<(Self::State, Vec<Self::Effect>), InvalidTransition>;
}

struct DriverState<M: StateMachine> {
    state: M::State,
    queue: VecDeque<M::Event>,
    draining: bool,
}

/// Releases the drain if an executor unwinds, so later events still run.
struct DrainGuard<'a, M: StateMachine>(&'a Mutex<DriverState<M>>);

impl<M: StateMachine> Drop for DrainGuard<'_, M> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut inner = self.0.lock();
            inner.queue.clear();
            inner.draining = false;
        }
    }
}

/// Serialises events through a state machine.
pub struct Driver<M: StateMachine> {
    name: String,
    inner: Mutex<DriverState<M>>,
}

impl<M: StateMachine> Driver<M> {
    /// Create a driver in `initial`.
    pub fn new(name: impl Into<String>, initial: M::State) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(DriverState {
                state: initial,
                queue: VecDeque::new(),
                draining: false,
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> M::State {
        self.inner.lock().state
    }

    /// Fire `event`, running resulting effects through `execute`.
    ///
    /// # Panics
    ///
    /// On an event the current state does not define. That is a protocol
    /// violation by the caller and must not be swallowed.
    pub fn fire<F>(&self, event: M::Event, mut execute: F)
    where
        F: FnMut(M::Effect),
    {
        {
            let mut inner = self.inner.lock();
            inner.queue.push_back(event);
            if inner.draining {
                return;
            }
            inner.draining = true;
        }

        let _guard = DrainGuard(&self.inner);
        loop {
            let effects = {
                let mut inner = self.inner.lock();
                let Some(event) = inner.queue.pop_front() else {
                    inner.draining = false;
                    return;
                };
                match M::transition(inner.state, event) {
                    Ok((next, effects)) => {
                        if next != inner.state {
                            tracing::trace!(
                                machine = M::NAME,
                                name = %self.name,
                                from = ?inner.state,
                                to = ?next,
                                ?event,
                                "transition"
                            );
                        }
                        inner.state = next;
                        effects
                    }
                    Err(err) => {
                        drop(inner);
                        tracing::error!(name = %self.name, "{}", err);
                        panic!("{} on {}", err, self.name);
                    }
                }
            };

            for effect in effects {
                execute(effect);
            }
        }
    }
}
