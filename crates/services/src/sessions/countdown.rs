use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::workflow::SessionController;

/// Background heartbeat that drives a controller's countdown.
///
/// Calls [`SessionController::tick`] once per period until the controller
/// reaches a terminal phase. Dropping the handle aborts the task, so no
/// tick can land after teardown.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawn the heartbeat with the standard one-second period.
    #[must_use]
    pub fn spawn(controller: Arc<SessionController>) -> Self {
        Self::spawn_with_period(controller, Duration::from_secs(1))
    }

    /// Spawn the heartbeat with a custom period, for demos and tests.
    #[must_use]
    pub fn spawn_with_period(controller: Arc<SessionController>, period: Duration) -> Self {
        // tokio intervals reject a zero period
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            // first fire lands one full period after spawn; missed ticks
            // are skipped, not replayed in a burst
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                controller.tick().await;
                if controller.is_finished() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// True once the task has ended, by finishing or by abort.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the heartbeat now instead of waiting for drop.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
