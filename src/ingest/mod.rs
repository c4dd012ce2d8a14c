// src/ingest/mod.rs
pub mod poller;
pub mod providers;
pub mod scheduler;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use regex::Regex;
use sha2::{Digest, Sha256};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Total entries parsed from feeds.");
        describe_counter!(
            "feed_matched_total",
            "New entries matching the target server."
        );
        describe_counter!("feed_errors_total", "Feed fetch/parse errors.");
        describe_counter!("notifications_sent_total", "Messages delivered.");
        describe_counter!(
            "notification_errors_total",
            "Messages that failed to deliver."
        );
        describe_counter!("polls_total", "Completed poll cycles.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("seen_entries", "Identifiers currently in the seen set.");
        describe_gauge!("poll_last_run_ts", "Unix ts when the last poll finished.");
    });
}

/// Normalize entry body: drop tags, decode entities, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // Tags become spaces so adjacent list items don't run together.
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let out = re_tags.replace_all(s, " ");

    let out = html_escape::decode_html_entities(&out).to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// guid, else link, else a content hash.
pub fn derive_identifier(guid: Option<&str>, link: &str, title: &str, content: &str) -> String {
    if let Some(g) = guid.map(str::trim).filter(|g| !g.is_empty()) {
        return g.to_string();
    }
    let link = link.trim();
    if !link.is_empty() {
        return link.to_string();
    }
    let digest = Sha256::digest(format!("{title}\n{content}").as_bytes());
    format!("sha256:{digest:x}")
}

/// The server segment of the title wins. Feeds file the resource class under
/// `<category>`, so a category only counts when the title names no server.
pub fn derive_server_tag<'a, I>(categories: I, title: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(tag) = server_segment(title) {
        return tag.to_string();
    }
    categories
        .into_iter()
        .map(str::trim)
        .find(|c| !c.is_empty())
        .unwrap_or_else(|| title.trim())
        .to_string()
}

/// `Name (Server)` -> `Server`; `Name - Server` -> `Server`; otherwise the title.
pub fn server_tag_from_title(title: &str) -> String {
    server_segment(title).unwrap_or_else(|| title.trim()).to_string()
}

fn server_segment(title: &str) -> Option<&str> {
    let t = title.trim();
    if let Some(inner) = t.strip_suffix(')') {
        if let Some(open) = inner.rfind('(') {
            let tag = inner[open + 1..].trim();
            if !tag.is_empty() {
                return Some(tag);
            }
        }
    }
    t.rfind(" - ")
        .map(|idx| t[idx + 3..].trim())
        .filter(|tag| !tag.is_empty())
}
