//! Edge-triggered pause/resume state machine.
//!
//! The activity signal is polled and noisy; the farm must see at most one
//! command pair per activity transition, never one per poll. The transition
//! function here is pure so the edge-triggering invariant can be tested
//! without any I/O.

/// Farm-side condition the controller last asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No decision has been made yet. Only ever observed before the first
    /// poll; guarantees the first observation always produces an action, so
    /// the farm's real state is explicitly set at least once at startup.
    Unknown,
    /// Processing is suppressed because playback was active.
    Paused,
    /// Processing is allowed.
    Running,
}

/// Command pair to execute for one edge of the activity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Pause the farm globally, then cancel in-flight work.
    Suspend,
    /// Resume the farm globally, then requeue work this controller killed.
    Resume,
}

impl Directive {
    /// State the controller holds after executing this directive. The state
    /// advances even when part of the command pair fails; the poll interval
    /// is the retry mechanism, not re-assertion.
    pub fn next_state(self) -> ControllerState {
        match self {
            Directive::Suspend => ControllerState::Paused,
            Directive::Resume => ControllerState::Running,
        }
    }
}

/// Edge-triggered transition function.
///
/// Emits a directive only when the activity signal disagrees with the
/// current state. A steady signal is an explicit no-op rather than a
/// re-assertion of the same command, which bounds the command rate and
/// avoids fighting manual operator overrides between polls.
pub fn decide(state: ControllerState, active_sessions: u64) -> Option<Directive> {
    if active_sessions > 0 {
        match state {
            ControllerState::Paused => None,
            _ => Some(Directive::Suspend),
        }
    } else {
        match state {
            ControllerState::Running => None,
            _ => Some(Directive::Resume),
        }
    }
}
