// src/config/mod.rs
//! Process configuration, read once from the environment at startup.

pub mod feeds;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::ingest::scheduler::DEFAULT_CHECK_INTERVAL_SECS;
use crate::seen::DEFAULT_MAX_SEEN;

pub const ENV_TOKEN: &str = "DISCORD_BOT_TOKEN";
pub const ENV_CHANNEL: &str = "DISCORD_CHANNEL_ID";
pub const ENV_TARGET: &str = "TARGET_SERVER_NAME";
pub const ENV_INTERVAL: &str = "CHECK_INTERVAL_SECONDS";
pub const ENV_MAX_SEEN: &str = "MAX_SEEN_ENTRIES";
pub const ENV_FEED_URLS: &str = "FEED_URLS";
pub const ENV_FEED_LIST_PATH: &str = "FEED_LIST_PATH";
pub const ENV_FETCH_TIMEOUT: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "FEED_USER_AGENT";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

pub const DEFAULT_TARGET_SERVER: &str = "Sentinels Republic 2";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
// FeedBurner serves an interstitial page to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub channel_id: u64,
    pub target_server: String,
    pub check_interval: Duration,
    pub max_seen: usize,
    pub feed_urls: Vec<String>,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub metrics_addr: Option<SocketAddr>,
}

// Hand-written so the token never lands in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &format_args!("<{} chars>", self.discord_token.len()))
            .field("channel_id", &self.channel_id)
            .field("target_server", &self.target_server)
            .field("check_interval", &self.check_interval)
            .field("max_seen", &self.max_seen)
            .field("feed_urls", &self.feed_urls)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("user_agent", &self.user_agent)
            .field("metrics_addr", &self.metrics_addr)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let discord_token = get(ENV_TOKEN).ok_or(ConfigError::Missing(ENV_TOKEN))?;
        let channel_raw = get(ENV_CHANNEL).ok_or(ConfigError::Missing(ENV_CHANNEL))?;
        let channel_id = parse_positive::<u64>(ENV_CHANNEL, &channel_raw)?;

        let target_server = get(ENV_TARGET).unwrap_or_else(|| DEFAULT_TARGET_SERVER.to_string());

        let interval_secs = match get(ENV_INTERVAL) {
            Some(v) => parse_positive::<u64>(ENV_INTERVAL, &v)?,
            None => DEFAULT_CHECK_INTERVAL_SECS,
        };
        let max_seen = match get(ENV_MAX_SEEN) {
            Some(v) => parse_positive::<usize>(ENV_MAX_SEEN, &v)?,
            None => DEFAULT_MAX_SEEN,
        };
        let fetch_timeout_secs = match get(ENV_FETCH_TIMEOUT) {
            Some(v) => parse_positive::<u64>(ENV_FETCH_TIMEOUT, &v)?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let feed_urls = if let Some(p) = get(ENV_FEED_LIST_PATH) {
            feeds::load_feed_list_from(&PathBuf::from(p))
                .map_err(|e| ConfigError::FeedList(format!("{e:#}")))?
        } else if let Some(csv) = get(ENV_FEED_URLS) {
            let v = feeds::parse_feed_csv(&csv);
            if v.is_empty() {
                return Err(ConfigError::Invalid {
                    key: ENV_FEED_URLS,
                    value: csv,
                    reason: "no URLs",
                });
            }
            v
        } else {
            feeds::default_feed_urls()
        };

        let metrics_addr = match get(ENV_METRICS_ADDR) {
            Some(v) => Some(v.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
                key: ENV_METRICS_ADDR,
                value: v.clone(),
                reason: "expected host:port",
            })?),
            None => None,
        };

        Ok(Self {
            discord_token,
            channel_id,
            target_server,
            check_interval: Duration::from_secs(interval_secs),
            max_seen,
            feed_urls,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            user_agent: get(ENV_USER_AGENT).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            metrics_addr,
        })
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        Ok(_) => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero",
        }),
        Err(_) => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "not a number",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| m.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let c = cfg(&[(ENV_TOKEN, "tok"), (ENV_CHANNEL, "123")]).unwrap();
        assert_eq!(c.channel_id, 123);
        assert_eq!(c.target_server, "Sentinels Republic 2");
        assert_eq!(c.check_interval, Duration::from_secs(300));
        assert_eq!(c.max_seen, 200);
        assert_eq!(c.feed_urls.len(), 7);
        assert_eq!(c.fetch_timeout, Duration::from_secs(20));
        assert_eq!(c.user_agent, "Mozilla/5.0");
        assert!(c.metrics_addr.is_none());
    }

    #[test]
    fn missing_required_values() {
        assert!(matches!(
            cfg(&[(ENV_CHANNEL, "1")]),
            Err(ConfigError::Missing(ENV_TOKEN))
        ));
        assert!(matches!(
            cfg(&[(ENV_TOKEN, "t"), (ENV_CHANNEL, "   ")]),
            Err(ConfigError::Missing(ENV_CHANNEL))
        ));
    }

    #[test]
    fn zero_or_garbage_channel_rejected() {
        assert!(matches!(
            cfg(&[(ENV_TOKEN, "t"), (ENV_CHANNEL, "0")]),
            Err(ConfigError::Invalid { key: ENV_CHANNEL, .. })
        ));
        assert!(matches!(
            cfg(&[(ENV_TOKEN, "t"), (ENV_CHANNEL, "abc")]),
            Err(ConfigError::Invalid { key: ENV_CHANNEL, .. })
        ));
    }

    #[test]
    fn overrides_are_read() {
        let c = cfg(&[
            (ENV_TOKEN, "t"),
            (ENV_CHANNEL, "9"),
            (ENV_TARGET, "SWG Infinity"),
            (ENV_INTERVAL, "60"),
            (ENV_MAX_SEEN, "1000"),
            (ENV_FEED_URLS, "https://a, https://b"),
            (ENV_FETCH_TIMEOUT, "5"),
            (ENV_METRICS_ADDR, "127.0.0.1:9100"),
        ])
        .unwrap();
        assert_eq!(c.target_server, "SWG Infinity");
        assert_eq!(c.check_interval, Duration::from_secs(60));
        assert_eq!(c.max_seen, 1000);
        assert_eq!(c.feed_urls, vec!["https://a".to_string(), "https://b".to_string()]);
        assert_eq!(c.fetch_timeout, Duration::from_secs(5));
        assert_eq!(c.metrics_addr, Some("127.0.0.1:9100".parse().unwrap()));
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(matches!(
            cfg(&[(ENV_TOKEN, "t"), (ENV_CHANNEL, "9"), (ENV_INTERVAL, "0")]),
            Err(ConfigError::Invalid { key: ENV_INTERVAL, .. })
        ));
    }

    #[test]
    fn debug_hides_token() {
        let c = cfg(&[(ENV_TOKEN, "super-secret"), (ENV_CHANNEL, "1")]).unwrap();
        let s = format!("{c:?}");
        assert!(!s.contains("super-secret"));
    }
}
