// tests/config_env.rs
use harvest_notifier::config::{Config, ENV_CHANNEL, ENV_FEED_LIST_PATH, ENV_FEED_URLS, ENV_TOKEN};
use harvest_notifier::ConfigError;
use std::{env, fs};

fn clear() {
    for k in [ENV_TOKEN, ENV_CHANNEL, ENV_FEED_URLS, ENV_FEED_LIST_PATH] {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn missing_token_is_fatal() {
    clear();
    env::set_var(ENV_CHANNEL, "123");
    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing(ENV_TOKEN)));
    assert_eq!(err.to_string(), "DISCORD_BOT_TOKEN is required");
    clear();
}

#[serial_test::serial]
#[test]
fn feed_list_file_beats_csv() {
    clear();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("feeds.toml");
    fs::write(&p, r#"feeds = ["https://one.test/rss", "https://two.test/rss"]"#).unwrap();

    env::set_var(ENV_TOKEN, "t");
    env::set_var(ENV_CHANNEL, "123");
    env::set_var(ENV_FEED_URLS, "https://ignored.test/rss");
    env::set_var(ENV_FEED_LIST_PATH, p.display().to_string());

    let c = Config::from_env().unwrap();
    assert_eq!(
        c.feed_urls,
        vec!["https://one.test/rss".to_string(), "https://two.test/rss".to_string()]
    );
    clear();
}

#[serial_test::serial]
#[test]
fn unreadable_feed_list_is_config_error() {
    clear();
    env::set_var(ENV_TOKEN, "t");
    env::set_var(ENV_CHANNEL, "123");
    env::set_var(ENV_FEED_LIST_PATH, "/nonexistent/feeds.toml");

    assert!(matches!(Config::from_env(), Err(ConfigError::FeedList(_))));
    clear();
}
