use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Notifier;
use crate::error::NotifyError;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Posts plain messages to one channel through the Discord bot REST API.
#[derive(Clone)]
pub struct DiscordNotifier {
    token: String,
    channel_id: u64,
    base_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

/// The authenticated bot account, as returned by `GET /users/@me`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

#[derive(Serialize)]
struct AllowedMentions {
    parse: Vec<String>,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    allowed_mentions: AllowedMentions,
}

impl<'a> CreateMessage<'a> {
    fn plain(content: &'a str) -> Self {
        Self {
            content,
            // never ping anyone from feed text
            allowed_mentions: AllowedMentions { parse: vec![] },
        }
    }
}

impl DiscordNotifier {
    pub fn new(token: String, channel_id: u64) -> Self {
        Self {
            token,
            channel_id,
            base_url: DISCORD_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Total attempts per message (at least 1).
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Startup check: token is valid and the channel is visible to the bot.
    pub async fn verify(&self) -> Result<BotUser, NotifyError> {
        let me = self
            .client
            .get(format!("{}/users/@me", self.base_url))
            .header("Authorization", self.auth_header())
            .timeout(self.timeout)
            .send()
            .await?;
        let me: BotUser = check_status(me).await?.json().await?;

        let ch = self
            .client
            .get(format!("{}/channels/{}", self.base_url, self.channel_id))
            .header("Authorization", self.auth_header())
            .timeout(self.timeout)
            .send()
            .await?;
        let ch: ChannelInfo = check_status(ch).await?.json().await?;
        tracing::info!(
            channel_id = %ch.id,
            channel = ch.name.as_deref().unwrap_or("?"),
            "discord channel reachable"
        );

        Ok(me)
    }

    async fn post_once(&self, text: &str) -> Result<(), NotifyError> {
        let rsp = self
            .client
            .post(format!(
                "{}/channels/{}/messages",
                self.base_url, self.channel_id
            ))
            .header("Authorization", self.auth_header())
            .timeout(self.timeout)
            .json(&CreateMessage::plain(text))
            .send()
            .await?;
        check_status(rsp).await.map(|_| ())
    }
}

/// Map non-2xx responses onto `NotifyError`; pass successes through.
async fn check_status(rsp: Response) -> Result<Response, NotifyError> {
    let status = rsp.status();
    if status.is_success() {
        return Ok(rsp);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_ms = rsp
            .json::<RateLimitBody>()
            .await
            .map(|b| (b.retry_after.max(0.0) * 1_000.0) as u64)
            .unwrap_or(1_000);
        return Err(NotifyError::RateLimited { retry_after_ms });
    }
    Err(classify(status))
}

fn classify(status: StatusCode) -> NotifyError {
    match status {
        StatusCode::UNAUTHORIZED => NotifyError::Unauthorized,
        StatusCode::FORBIDDEN => NotifyError::Forbidden,
        StatusCode::NOT_FOUND => NotifyError::UnknownChannel,
        other => NotifyError::Http(other.as_u16()),
    }
}

fn is_retryable(e: &NotifyError) -> bool {
    match e {
        NotifyError::RateLimited { .. } => true,
        NotifyError::Http(code) => *code >= 500,
        NotifyError::Transport(err) => err.is_timeout() || err.is_connect(),
        _ => false,
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.post_once(text).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    let wait = match &e {
                        NotifyError::RateLimited { retry_after_ms } => {
                            Duration::from_millis(*retry_after_ms)
                        }
                        _ => Duration::from_millis(500u64 << (attempt - 1)),
                    };
                    tracing::debug!(error = %e, attempt, ?wait, "discord send retry");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(classify(StatusCode::UNAUTHORIZED), NotifyError::Unauthorized));
        assert!(matches!(classify(StatusCode::FORBIDDEN), NotifyError::Forbidden));
        assert!(matches!(classify(StatusCode::NOT_FOUND), NotifyError::UnknownChannel));
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY),
            NotifyError::Http(502)
        ));
    }

    #[test]
    fn only_transient_errors_retry() {
        assert!(is_retryable(&NotifyError::Http(503)));
        assert!(is_retryable(&NotifyError::RateLimited { retry_after_ms: 10 }));
        assert!(!is_retryable(&NotifyError::Http(400)));
        assert!(!is_retryable(&NotifyError::Forbidden));
    }

    #[test]
    fn payload_disables_mentions() {
        let v = serde_json::to_value(CreateMessage::plain("@everyone hi")).unwrap();
        assert_eq!(v["content"], "@everyone hi");
        assert_eq!(v["allowed_mentions"]["parse"], serde_json::json!([]));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let n = DiscordNotifier::new("t".into(), 1).with_base_url("http://localhost:1/");
        assert_eq!(n.base_url, "http://localhost:1");
    }
}
