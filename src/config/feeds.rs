// src/config/feeds.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The Galaxy Harvester "resource added" feeds, one per resource category.
pub const DEFAULT_FEED_URLS: [&str; 7] = [
    "https://feeds.feedburner.com/GalaxyHarvesterMineralResourceAdds",
    "https://feeds.feedburner.com/GalaxyHarvesterChemicalResourceAdds",
    "https://feeds.feedburner.com/GalaxyHarvesterFloraResourceAdds",
    "https://feeds.feedburner.com/GalaxyHarvesterGasResourceAdds",
    "https://feeds.feedburner.com/GalaxyHarvesterWaterResourceAdds",
    "https://feeds.feedburner.com/GalaxyHarvesterEnergyResourceAdds",
    "https://feeds.feedburner.com/GalaxyHarvesterCreatureResourceAdds",
];

pub fn default_feed_urls() -> Vec<String> {
    DEFAULT_FEED_URLS.iter().map(|s| s.to_string()).collect()
}

/// Either `feeds = [...]` (TOML or a JSON object) or a bare JSON array.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeedListFile {
    Table { feeds: Vec<String> },
    Urls(Vec<String>),
}

impl FeedListFile {
    fn into_urls(self) -> Vec<String> {
        match self {
            Self::Table { feeds } | Self::Urls(feeds) => feeds,
        }
    }
}

/// Load feed URLs from a file. A `.json` extension or a leading `[` selects
/// JSON, anything else is read as TOML.
pub fn load_feed_list_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        || content.trim_start().starts_with('[');

    let file: FeedListFile = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("parsing {} as JSON", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("parsing {} as TOML", path.display()))?
    };

    let list = clean_list(file.into_urls());
    if list.is_empty() {
        return Err(anyhow!("feed list {} is empty", path.display()));
    }
    Ok(list)
}

/// Comma separated list, as used by `FEED_URLS`.
pub fn parse_feed_csv(s: &str) -> Vec<String> {
    clean_list(s.split(',').map(str::to_string).collect())
}

/// Trim, drop blanks and repeats, keep first-seen order (feeds are polled in order).
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
