//! Progress poller.
//!
//! Ticks the engine at a fixed period so it can publish
//! `PlaybackEvent::PositionChanged` while playing. The poller never reads
//! the primitive itself; the engine does that on its own task, where a
//! primitive torn down mid-read is simply "no data".

use std::time::Duration;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::engine::EngineCommand;

pub(crate) struct ProgressPoller {
    task: JoinHandle<()>,
}

impl ProgressPoller {
    /// Start ticking `mailbox` every `period`. Stops on its own once the
    /// engine is gone.
    pub(crate) fn spawn(period: Duration, mailbox: WeakUnboundedSender<EngineCommand>) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(sender) = mailbox.upgrade() else {
                    break;
                };
                if sender.send(EngineCommand::ProgressTick).is_err() {
                    break;
                }
            }
            debug!("Progress poller stopped");
        });
        Self { task }
    }

    pub(crate) fn stop(self) {
        self.task.abort();
    }
}
