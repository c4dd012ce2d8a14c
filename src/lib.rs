// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod seen;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::error::{ConfigError, FeedError, NotifyError};
pub use crate::extract::{extract, ResourceValue};
pub use crate::ingest::poller::{FeedPoller, PollResult};
pub use crate::ingest::scheduler::Scheduler;
pub use crate::ingest::types::{FeedEntry, FeedSource};
pub use crate::notify::{Notification, Notifier};
pub use crate::seen::SeenEntrySet;
