//! Deployment state machine
//!
//! [`Phase`] tracks where an invocation is in the cutover sequence.
//! [`next_state`] is the pure descriptor transition applied at commit time.

use crate::descriptor::{Descriptor, InstanceRef};

/// Orchestrator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Descriptor loaded, no role change in flight
    Idle,
    /// New active instance being created
    Provisioning,
    /// DNS being repointed
    CuttingOver,
    /// Descriptor being persisted with swapped roles
    Committing,
}

impl Phase {
    /// Whether `next` may follow `self`.
    ///
    /// Any phase may fall back to `Idle` when the invocation fails.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, Provisioning)
                | (Idle, CuttingOver)
                | (Idle, Committing)
                | (Provisioning, CuttingOver)
                | (CuttingOver, Committing)
                | (_, Idle)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Provisioning => write!(f, "provisioning"),
            Phase::CuttingOver => write!(f, "cutting-over"),
            Phase::Committing => write!(f, "committing"),
        }
    }
}

/// A completed step that changes the descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// DNS now points at a freshly provisioned instance
    Deployed(InstanceRef),
    /// DNS now points back at the previous instance
    RolledBack,
    /// The idle instance has been deleted
    Retired,
}

/// Apply `event` to `descriptor`, returning the state to commit
pub fn next_state(descriptor: &Descriptor, event: &Event) -> Descriptor {
    let mut next = descriptor.clone();
    match event {
        Event::Deployed(instance) => {
            next.previous = descriptor.current.clone();
            next.current = instance.clone();
            next.rollback_requested = false;
        }
        Event::RolledBack => {
            next.current = descriptor.previous.clone();
            next.previous = descriptor.current.clone();
            next.rollback_requested = false;
        }
        Event::Retired => {
            next.previous.endpoint.clear();
        }
    }
    next
}
