//! Auth Check Scheduler
//!
//! Background ticker that refreshes an authenticated session shortly before
//! its token expires. Ticks once immediately, then every `period`.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::manager::SessionManager;

/// Handle to the running ticker.
///
/// Dropping the handle leaves the task running for the life of the process;
/// call [`SchedulerHandle::stop`] to end it.
#[derive(Debug)]
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn stop(self) {
        self.task.abort();
        info!("Auth check scheduler stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub(crate) fn spawn(manager: Arc<SessionManager>, period: Duration) -> SchedulerHandle {
    info!(period_secs = period.as_secs(), "Starting auth check scheduler");

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if manager.refresh_if_near_expiration().await {
                debug!(status = ?manager.auth_status(), "Scheduled refresh finished");
            }
        }
    });

    SchedulerHandle { task }
}
