// src/ingest/types.rs
use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub identifier: String,        // guid, else link, else content hash
    pub title: String,
    pub link: String,
    pub content_text: String,      // normalized body text
    pub server_tag: String,        // title's server segment, else category
    pub published_at: Option<u64>, // unix seconds
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>, FeedError>;
    fn name(&self) -> &str;
}
