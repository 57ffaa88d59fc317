// src/types.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One upstream origin of trend data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Google,
    Youtube,
}

impl Source {
    /// The other provider for the same region; used by the overlap detector.
    pub fn counterpart(self) -> Self {
        match self {
            Source::Google => Source::Youtube,
            Source::Youtube => Source::Google,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Google => "google",
            Source::Youtube => "youtube",
        }
    }

    /// Display name used by renderers.
    pub fn label(self) -> &'static str {
        match self {
            Source::Google => "Google",
            Source::Youtube => "YouTube",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked keyword. Rank is positional (index within the snapshot);
/// the score unit varies by source and is never compared across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendItem {
    pub keyword: String,
    pub score: f64,
}

/// One point-in-time ranked list for a (provider, region) pair.
/// Immutable once built; `captured_at` is an ISO-8601 string so that a
/// corrupt timestamp in persisted data degrades to `None` instead of
/// breaking deserialization of the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub captured_at: String,
    pub geo: String,
    pub source: Source,
    pub items: Vec<TrendItem>,
}

impl Snapshot {
    pub fn captured_ts(&self) -> Option<DateTime<Utc>> {
        parse_iso(&self.captured_at)
    }
}

/// The retained, time-ordered snapshot sequence for a (provider, region)
/// pair. Invariants (maintained by `history::append`, the only mutator):
/// strictly ascending `captured_at`, no duplicates, everything within the
/// retention window as of the last append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub geo: String,
    pub source: Source,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl History {
    pub fn empty(source: Source, geo: &str) -> Self {
        Self {
            geo: geo.to_string(),
            source,
            snapshots: Vec::new(),
        }
    }
}

/// A related article attached to a search-trends keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: String,
}

/// Supplementary per-keyword payload, stored next to the snapshot but never
/// part of ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextPayload {
    Articles {
        articles: Vec<Article>,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        channel_title: String,
        published_at: String,
        video_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub keyword: String,
    #[serde(flatten)]
    pub payload: ContextPayload,
}

/// Context document persisted alongside a snapshot, aligned to its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDoc {
    pub captured_at: String,
    pub geo: String,
    pub source: Source,
    pub items: Vec<ContextEntry>,
}

/// What one provider cycle produces: the ranked snapshot plus its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendBundle {
    pub snapshot: Snapshot,
    pub context: ContextDoc,
}

pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// ISO-8601 with millisecond precision, the format every snapshot carries.
pub fn to_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
