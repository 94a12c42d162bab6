//! Layout pass state machine.
//!
//! `Idle → Requested → AwaitingVeto → Computing → Committed → Idle`. A vetoed
//! or skipped pass returns to `Idle` without committing. At most one pass is in
//! flight; the composition coalesces requests that arrive meanwhile.

use std::fmt;

use waterfall_plugin::PendingVeto;

/// Observable phase of the layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutPhase {
    #[default]
    Idle,
    Requested,
    AwaitingVeto,
    Computing,
    Committed,
}

impl LayoutPhase {
    /// True while a pass has started and not yet finished.
    pub fn is_in_flight(self) -> bool {
        matches!(self, LayoutPhase::AwaitingVeto | LayoutPhase::Computing)
    }
}

/// Internal state; the suspended veto lives inside the phase that owns it.
#[derive(Default)]
pub(crate) enum PassState {
    #[default]
    Idle,
    Requested,
    AwaitingVeto(PendingVeto),
    Computing,
    Committed,
}

impl PassState {
    pub(crate) fn phase(&self) -> LayoutPhase {
        match self {
            PassState::Idle => LayoutPhase::Idle,
            PassState::Requested => LayoutPhase::Requested,
            PassState::AwaitingVeto(_) => LayoutPhase::AwaitingVeto,
            PassState::Computing => LayoutPhase::Computing,
            PassState::Committed => LayoutPhase::Committed,
        }
    }
}

impl fmt::Debug for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassState::AwaitingVeto(pending) => {
                f.debug_tuple("AwaitingVeto").field(&pending.plugin()).finish()
            }
            other => fmt::Debug::fmt(&other.phase(), f),
        }
    }
}
