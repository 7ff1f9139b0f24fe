//! The poll/decide/act cycle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::{CancellationEngine, ReconciliationEngine};
use crate::farm::{CANCEL_CAUSE, FarmClient};
use crate::playback::probe::ActivityProbe;
use crate::state::{ControllerState, Directive, decide};

/// Owns the single piece of state in the system and sequences the engines.
///
/// One cycle: probe, decide, act, sleep. Outbound calls are bounded by
/// per-call timeouts and never overlap; a failed call is logged and the
/// decision is re-evaluated naturally on the next poll. There is no fatal
/// path; the loop runs until the process is terminated externally.
pub struct Controller {
    probe: ActivityProbe,
    farm: Arc<dyn FarmClient>,
    state: ControllerState,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Starts in [`ControllerState::Unknown`] so the first poll always
    /// issues a corrective action, whatever the farm was left set to.
    pub fn new(probe: ActivityProbe, farm: Arc<dyn FarmClient>) -> Self {
        Self {
            probe,
            farm,
            state: ControllerState::Unknown,
        }
    }

    /// Current state, for diagnostics.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Runs one poll/decide/act cycle.
    pub async fn tick(&mut self) {
        let active = self.probe.probe().await;

        match decide(self.state, active) {
            Some(directive @ Directive::Suspend) => {
                info!("{active} active video session(s), pausing the farm");
                self.suspend().await;
                self.state = directive.next_state();
            }
            Some(directive @ Directive::Resume) => {
                info!("no active video sessions, resuming the farm");
                self.resume().await;
                self.state = directive.next_state();
            }
            None => {
                if active > 0 {
                    debug!("{active} active video session(s), farm remains paused");
                } else {
                    debug!("no active video sessions, farm remains running");
                }
            }
        }
    }

    /// Polls forever on a fixed cadence. The first tick fires immediately.
    pub async fn run(&mut self, poll_interval: Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Pause first so no new work starts, then sweep in-flight work. The
    /// sweep only runs when the pause landed; cancelled-but-unpaused would
    /// let the farm immediately restart everything it just killed.
    async fn suspend(&self) {
        match self.farm.set_global_pause(true).await {
            Ok(()) => {
                info!("farm nodes paused");
                CancellationEngine::new(self.farm.as_ref())
                    .cancel_all_active(CANCEL_CAUSE)
                    .await;
            }
            Err(err) => {
                warn!("failed to pause farm nodes: {err}");
            }
        }
    }

    /// Resume first, then hand back the jobs the controller killed.
    async fn resume(&self) {
        match self.farm.set_global_pause(false).await {
            Ok(()) => {
                info!("farm nodes resumed");
                ReconciliationEngine::new(self.farm.as_ref())
                    .requeue_script_cancelled(CANCEL_CAUSE)
                    .await;
            }
            Err(err) => {
                warn!("failed to resume farm nodes: {err}");
            }
        }
    }
}
