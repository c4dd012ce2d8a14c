// src/error.rs
use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("feed list: {0}")]
    FeedList(String),
}

/// Fetch/parse failures for a single feed. The poll cycle logs and moves on.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed returned HTTP {0}")]
    Status(u16),

    #[error("feed parse failed: {0}")]
    Parse(String),
}

/// Failures talking to the messaging platform.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("bot token rejected (401)")]
    Unauthorized,

    #[error("bot lacks permission to post in this channel (403)")]
    Forbidden,

    #[error("channel not found (404)")]
    UnknownChannel,

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("HTTP {0}")]
    Http(u16),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl NotifyError {
    /// Errors meaning the bot can no longer reach the channel at all.
    pub fn is_access_lost(&self) -> bool {
        matches!(self, NotifyError::Unauthorized | NotifyError::Forbidden)
    }
}
