//! Resource value extraction from free-text entry bodies.
//!
//! Galaxy Harvester lists resource stats as `DR: 780 (78%)`. We only care
//! about the highest absolute value and the stat it belongs to.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::fmt;

/// One labelled stat pulled out of an entry, e.g. `PE 949`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceValue {
    pub label: String,
    pub value: u32,
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.value)
    }
}

fn stat_regex() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<label>[A-Z]{2,}):\s*(?P<value>[0-9]+)\s*\((?P<pct>[0-9]+)%\)")
            .expect("stat regex is valid")
    })
}

/// Returns the stat with the greatest value. On ties the earliest one wins.
pub fn extract(text: &str) -> Option<ResourceValue> {
    let mut best: Option<ResourceValue> = None;

    for caps in stat_regex().captures_iter(text) {
        // Digit runs too large for u32 are skipped, not fatal.
        let Ok(value) = caps["value"].parse::<u32>() else {
            continue;
        };
        let beats = best.as_ref().map_or(true, |b| value > b.value);
        if beats {
            best = Some(ResourceValue {
                label: caps["label"].to_string(),
                value,
            });
        }
    }

    best
}

/// The emphasized follow-up line posted after the entry link.
pub fn highlight(v: &ResourceValue) -> String {
    format!("Highest value = **{v}**")
}
