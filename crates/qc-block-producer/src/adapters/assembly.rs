//! # In-Memory Committee Assembly
//!
//! Gathers signed join requests from the members selected for the next
//! view and runs them through the reconfiguration state machine:
//!
//! - **gather**: wait until more than `f` selected members have joined
//! - **nominate**: fix the nomination from the joins so far
//! - **certify**: certified once every selected member has joined
//! - **elect**: lock the slate (late joins included) and complete
//!
//! A host that cannot wait for every member calls [`MemoryAssembly::elect_now`].

use crate::adapters::memory_view::verify_member_signature;
use crate::domain::{ReconfigurationActions, ReconfigurationEvent, ReconfigurationState, ViewReconfiguration};
use crate::ports::{AssemblyFactory, AssemblyListener, ViewAssembly};
use dashmap::DashMap;
use parking_lot::Mutex;
use shared_types::{Digest, JoinRequest, MemberId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// A committee assembly for one prospective view.
pub struct MemoryAssembly {
    next_view_id: Digest,
    members: BTreeSet<MemberId>,
    tolerance: usize,
    listener: Weak<dyn AssemblyListener>,
    reconfiguration: ViewReconfiguration,
    proposals: Mutex<BTreeMap<MemberId, JoinRequest>>,
    nominated: Mutex<Vec<MemberId>>,
    slate: Mutex<Vec<JoinRequest>>,
    gate: Mutex<()>,
    stopped: AtomicBool,
}

impl MemoryAssembly {
    /// Create an assembly; nothing happens until [`ViewAssembly::start`].
    pub fn new(
        next_view_id: Digest,
        members: BTreeSet<MemberId>,
        tolerance: usize,
        listener: Weak<dyn AssemblyListener>,
    ) -> Self {
        Self {
            reconfiguration: ViewReconfiguration::new(next_view_id.to_string()),
            next_view_id,
            members,
            tolerance,
            listener,
            proposals: Mutex::new(BTreeMap::new()),
            nominated: Mutex::new(Vec::new()),
            slate: Mutex::new(Vec::new()),
            gate: Mutex::new(()),
            stopped: AtomicBool::new(false),
        }
    }

    /// Id of the view being assembled.
    pub fn next_view_id(&self) -> Digest {
        self.next_view_id
    }

    /// Reconfiguration state.
    pub fn state(&self) -> ReconfigurationState {
        self.reconfiguration.state()
    }

    /// Members nominated for the next committee.
    pub fn nominated(&self) -> Vec<MemberId> {
        self.nominated.lock().clone()
    }

    /// Offer a join request. Returns true if it was accepted.
    pub fn offer_join(&self, join: JoinRequest) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }
        if join.view != self.next_view_id || !self.members.contains(&join.member) {
            trace!(view = %self.next_view_id, joiner = %join.member, "Join not for this assembly");
            return false;
        }
        if !verify_member_signature(&join.member, join.view.as_bytes(), &join.signature) {
            trace!(view = %self.next_view_id, joiner = %join.member, "Invalid join signature");
            return false;
        }

        let _gate = self.gate.lock();
        let joined = {
            let mut proposals = self.proposals.lock();
            if proposals.contains_key(&join.member) {
                return false;
            }
            proposals.insert(join.member, join);
            proposals.len()
        };

        match self.state() {
            ReconfigurationState::Gather if joined > self.tolerance => {
                self.fire(ReconfigurationEvent::Gathered);
            }
            ReconfigurationState::Certification => {
                self.fire(ReconfigurationEvent::Gathered);
                if joined == self.members.len() {
                    self.fire(ReconfigurationEvent::Certified);
                }
            }
            _ => {}
        }
        true
    }

    /// Elect with the joins gathered so far.
    pub fn elect_now(&self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let _gate = self.gate.lock();
        self.fire(ReconfigurationEvent::Election);
    }

    /// Abort the assembly, reporting failure.
    pub fn fail(&self) {
        let _gate = self.gate.lock();
        self.fire(ReconfigurationEvent::Failed);
    }

    fn fire(&self, event: ReconfigurationEvent) {
        self.reconfiguration.fire(event, self);
    }
}

impl ReconfigurationActions for MemoryAssembly {
    fn gather(&self) {
        let joined = self.proposals.lock().len();
        debug!(view = %self.next_view_id, joined, members = self.members.len(), "Gathering joins");
        if joined > self.tolerance {
            self.fire(ReconfigurationEvent::Gathered);
        }
    }

    fn nominate(&self) {
        let nominated: Vec<MemberId> = self.proposals.lock().keys().copied().collect();
        debug!(view = %self.next_view_id, nominated = nominated.len(), "Nominating");
        *self.nominated.lock() = nominated;
        self.fire(ReconfigurationEvent::Nominated);
    }

    fn certify(&self) {
        if self.nominated.lock().len() == self.members.len() {
            self.fire(ReconfigurationEvent::Certified);
        }
    }

    fn elect(&self) {
        let slate: Vec<JoinRequest> = self.proposals.lock().values().cloned().collect();
        debug!(view = %self.next_view_id, slate = slate.len(), "Elected");
        *self.slate.lock() = slate;
        self.fire(ReconfigurationEvent::Complete);
    }

    fn complete(&self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let slate = self.slate.lock().clone();
        if let Some(listener) = self.listener.upgrade() {
            listener.assembly_complete(slate);
        }
    }

    fn failed(&self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        if let Some(listener) = self.listener.upgrade() {
            listener.assembly_failed();
        }
    }
}

impl ViewAssembly for MemoryAssembly {
    fn start(&self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let _gate = self.gate.lock();
        self.fire(ReconfigurationEvent::Assembled);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}

/// Creates [`MemoryAssembly`] instances and keeps them addressable by
/// view id so hosts can route join requests.
#[derive(Default)]
pub struct MemoryAssemblyFactory {
    tolerance: usize,
    assemblies: DashMap<Digest, Arc<MemoryAssembly>>,
}

impl MemoryAssemblyFactory {
    /// Create a factory for fault tolerance `f`.
    pub fn new(tolerance: usize) -> Self {
        Self {
            tolerance,
            assemblies: DashMap::new(),
        }
    }

    /// The assembly for `view_id`, if one was created.
    pub fn assembly(&self, view_id: &Digest) -> Option<Arc<MemoryAssembly>> {
        self.assemblies.get(view_id).map(|entry| Arc::clone(entry.value()))
    }
}

impl AssemblyFactory for MemoryAssemblyFactory {
    fn assemble(
        &self,
        next_view_id: Digest,
        members: BTreeSet<MemberId>,
        listener: Weak<dyn AssemblyListener>,
    ) -> Arc<dyn ViewAssembly> {
        let assembly = Arc::new(MemoryAssembly::new(next_view_id, members, self.tolerance, listener));
        self.assemblies.insert(next_view_id, Arc::clone(&assembly));
        assembly
    }
}
