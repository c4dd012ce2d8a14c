pub mod discord;
pub mod memory;

use crate::error::NotifyError;
use crate::extract::{self, ResourceValue};
use crate::ingest::types::FeedEntry;

/// Delivers one text message to the configured destination channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// What gets posted for one new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub link: String,
    pub best: Option<ResourceValue>,
}

impl Notification {
    pub fn for_entry(entry: &FeedEntry) -> Self {
        // Entries without a link still get announced by title.
        let link = if entry.link.is_empty() {
            entry.title.clone()
        } else {
            entry.link.clone()
        };
        Self {
            link,
            best: extract::extract(&entry.content_text),
        }
    }

    /// The link first (Discord unfurls it), then the highlight if any.
    pub fn messages(&self) -> Vec<String> {
        let mut out = vec![self.link.clone()];
        if let Some(best) = &self.best {
            out.push(extract::highlight(best));
        }
        out
    }
}
