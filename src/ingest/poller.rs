// src/ingest/poller.rs
use metrics::{counter, gauge};
use std::sync::Arc;

use crate::ingest::ensure_metrics_described;
use crate::ingest::types::{FeedEntry, FeedSource};
use crate::notify::{Notification, Notifier};
use crate::seen::SeenEntrySet;

/// Counts for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollResult {
    /// New entries for the target server recorded this cycle.
    pub processed: usize,
    /// Entries whose link message was delivered.
    pub notified: usize,
    /// Feeds that failed to fetch or parse.
    pub failed_sources: usize,
}

enum Outcome {
    Notified,
    Silent,
    AccessLost,
}

/// Fetches every feed, picks new entries for the target server and announces them.
pub struct FeedPoller {
    sources: Vec<Box<dyn FeedSource>>,
    notifier: Arc<dyn Notifier>,
    target_server: String,
    seen: SeenEntrySet,
}

impl FeedPoller {
    pub fn new(
        sources: Vec<Box<dyn FeedSource>>,
        notifier: Arc<dyn Notifier>,
        target_server: impl Into<String>,
        seen: SeenEntrySet,
    ) -> Self {
        ensure_metrics_described();
        Self {
            sources,
            notifier,
            target_server: target_server.into(),
            seen,
        }
    }

    pub fn seen(&self) -> &SeenEntrySet {
        &self.seen
    }

    pub fn target_server(&self) -> &str {
        &self.target_server
    }

    /// Exact, case-sensitive.
    pub fn is_target(&self, entry: &FeedEntry) -> bool {
        entry.server_tag == self.target_server
    }

    /// One pass over all feeds. With `notify == false` new entries are only
    /// marked seen (cold start).
    pub async fn poll(&mut self, notify: bool) -> PollResult {
        let mut result = PollResult::default();

        'feeds: for source in &self.sources {
            let entries = match source.fetch_latest().await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(feed = source.name(), error = %e, "feed fetch failed");
                    counter!("feed_errors_total").increment(1);
                    result.failed_sources += 1;
                    continue;
                }
            };

            for entry in entries {
                if !self.is_target(&entry) || self.seen.contains(&entry.identifier) {
                    continue;
                }
                counter!("feed_matched_total").increment(1);

                let outcome = if notify {
                    tracing::info!(
                        feed = source.name(),
                        id = %entry.identifier,
                        title = %entry.title,
                        published_at = ?entry.published_at,
                        "new match"
                    );
                    self.announce(&entry).await
                } else {
                    Outcome::Silent
                };

                // Recorded even when delivery failed, so a broken message
                // can't turn into a retry storm.
                self.seen.record(&entry.identifier);
                result.processed += 1;

                match outcome {
                    Outcome::Notified => result.notified += 1,
                    Outcome::Silent => {}
                    Outcome::AccessLost => {
                        tracing::error!(
                            "bot lost access to the channel; ending this poll early"
                        );
                        break 'feeds;
                    }
                }
            }
        }

        counter!("polls_total").increment(1);
        gauge!("seen_entries").set(self.seen.len() as f64);
        gauge!("poll_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

        tracing::debug!(
            notify,
            processed = result.processed,
            notified = result.notified,
            failed_sources = result.failed_sources,
            seen = self.seen.len(),
            "poll finished"
        );
        result
    }

    async fn announce(&self, entry: &FeedEntry) -> Outcome {
        let note = Notification::for_entry(entry);
        let mut delivered_link = false;

        for (n, msg) in note.messages().iter().enumerate() {
            match self.notifier.send(msg).await {
                Ok(()) => {
                    counter!("notifications_sent_total").increment(1);
                    if n == 0 {
                        delivered_link = true;
                    }
                }
                Err(e) => {
                    counter!("notification_errors_total").increment(1);
                    tracing::warn!(id = %entry.identifier, error = %e, "notification failed");
                    if e.is_access_lost() {
                        return Outcome::AccessLost;
                    }
                    // No highlight without the link it belongs to.
                    break;
                }
            }
        }

        if delivered_link {
            Outcome::Notified
        } else {
            Outcome::Silent
        }
    }
}
