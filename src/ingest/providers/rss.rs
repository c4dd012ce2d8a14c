use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::error::FeedError;
use crate::ingest::types::{FeedEntry, FeedSource};
use crate::ingest::{derive_identifier, derive_server_tag, normalize_text};

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Text>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded")]
    content_encoded: Option<String>,
    #[serde(rename = "category", default)]
    category: Vec<Text>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<Text>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    content: Option<Text>,
    summary: Option<Text>,
    #[serde(rename = "category", default)]
    category: Vec<AtomCategory>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term", default)]
    term: String,
}

/// Element text that may also carry attributes (`<guid isPermaLink=..>`, `<title type=..>`).
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Rss,
    Atom,
}

fn detect_format(s: &str) -> Option<Format> {
    match (s.find("<rss"), s.find("<feed")) {
        (Some(r), Some(a)) if a < r => Some(Format::Atom),
        (Some(_), _) => Some(Format::Rss),
        (None, Some(_)) => Some(Format::Atom),
        (None, None) => None,
    }
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

fn parse_rfc3339_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .map(|dt| dt.unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

/// Parse an RSS 2.0 or Atom document into entries, in document order.
pub fn parse_feed(s: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(s);

    let out = match detect_format(&xml_clean) {
        Some(Format::Rss) => {
            let rss: Rss =
                from_str(&xml_clean).map_err(|e| FeedError::Parse(format!("rss: {e}")))?;
            rss.channel.item.into_iter().map(rss_entry).collect::<Vec<_>>()
        }
        Some(Format::Atom) => {
            let feed: AtomFeed =
                from_str(&xml_clean).map_err(|e| FeedError::Parse(format!("atom: {e}")))?;
            feed.entry.into_iter().map(atom_entry).collect::<Vec<_>>()
        }
        None => return Err(FeedError::Parse("neither <rss> nor <feed> root".into())),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_total").increment(out.len() as u64);
    Ok(out)
}

fn rss_entry(it: Item) -> FeedEntry {
    let title = it.title.unwrap_or_default().trim().to_string();
    let link = it.link.unwrap_or_default().trim().to_string();
    let body = it
        .content_encoded
        .filter(|c| !c.trim().is_empty())
        .or(it.description)
        .unwrap_or_default();
    let content_text = normalize_text(&body);
    let identifier = derive_identifier(
        it.guid.as_ref().map(|g| g.value.as_str()),
        &link,
        &title,
        &content_text,
    );
    let server_tag = derive_server_tag(it.category.iter().map(|c| c.value.as_str()), &title);

    FeedEntry {
        identifier,
        title,
        link,
        content_text,
        server_tag,
        published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
    }
}

fn atom_entry(e: AtomEntry) -> FeedEntry {
    let title = e.title.map(|t| t.value).unwrap_or_default().trim().to_string();
    // rel="alternate" (or no rel) is the human-facing page.
    let link = e
        .link
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| e.link.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();
    let body = e
        .content
        .map(|c| c.value)
        .filter(|c| !c.trim().is_empty())
        .or(e.summary.map(|s| s.value))
        .unwrap_or_default();
    let content_text = normalize_text(&body);
    let identifier = derive_identifier(e.id.as_deref(), &link, &title, &content_text);
    let server_tag = derive_server_tag(e.category.iter().map(|c| c.term.as_str()), &title);

    FeedEntry {
        identifier,
        title,
        link,
        content_text,
        server_tag,
        published_at: e
            .published
            .or(e.updated)
            .as_deref()
            .and_then(parse_rfc3339_to_unix),
    }
}

/// Shared HTTP client for feed fetches. The timeout bounds a whole request so
/// a stuck feed cannot hold up later ticks.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, FeedError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(FeedError::from)
}

pub struct RssFeedSource {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeedSource {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            name: "fixture".to_string(),
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        let url = url.into();
        Self {
            name: url.clone(),
            mode: Mode::Http { url, client },
        }
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>, FeedError> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed(s),
            Mode::Http { url, client } => {
                let resp = client.get(url.as_str()).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FeedError::Status(status.as_u16()));
                }
                let body = resp.text().await?;
                parse_feed(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
