//! Fixed-interval refetching, the stand-in for a push channel.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns a polling task; dropping the handle stops the poll, so a view
/// that unmounts takes its interval down with it.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `tick` every `period`. The first tick fires after one full
/// period, not immediately; the consuming view already did its initial
/// fetch.
pub fn spawn_poll<F, Fut>(period: Duration, tick: F) -> PollHandle
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            tick().await;
        }
    });
    PollHandle { task }
}
