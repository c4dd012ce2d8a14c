// src/ingest/scheduler.rs
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::ingest::poller::FeedPoller;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Drives a `FeedPoller` on a fixed period.
pub struct Scheduler {
    poller: FeedPoller,
    period: Duration,
}

impl Scheduler {
    /// A zero period is bumped to one second.
    pub fn new(poller: FeedPoller, period: Duration) -> Self {
        Self {
            poller,
            period: period.max(Duration::from_secs(1)),
        }
    }

    /// Marks everything currently in the feeds as seen, then polls with
    /// notifications every period until `shutdown` resolves. An in-flight poll
    /// is allowed to finish. Hands the poller back for inspection.
    ///
    /// `shutdown` is polled from the start, so a signal listener inside it is
    /// armed before the first (possibly slow) fetch.
    pub async fn run_until<F>(mut self, shutdown: F) -> FeedPoller
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut stopping = false;
        let warm = {
            let warm_up = self.poller.poll(false);
            tokio::pin!(warm_up);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown, if !stopping => stopping = true,
                    r = &mut warm_up => break r,
                }
            }
        };
        tracing::info!(
            target: "scheduler",
            seeded = warm.processed,
            failed_sources = warm.failed_sources,
            "cold start: existing entries marked seen"
        );

        if stopping {
            tracing::info!(target: "scheduler", "shutdown during cold start");
            return self.poller;
        }

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let r = self.poller.poll(true).await;
            tracing::info!(
                target: "scheduler",
                processed = r.processed,
                notified = r.notified,
                failed_sources = r.failed_sources,
                "poll tick"
            );
        }

        tracing::info!(target: "scheduler", "scheduler stopped");
        self.poller
    }

    /// Run on a background task.
    pub fn spawn<F>(self, shutdown: F) -> JoinHandle<FeedPoller>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run_until(shutdown))
    }
}
