// src/ingest/providers/youtube.rs
//! Video-popularity provider. The most-popular listing returns ~50 raw
//! videos; repeated uploads of the same title are fused into one topic with
//! a log-damped view weight, so a single viral outlier cannot dominate the
//! board linearly.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::error::TrendError;
use crate::fetch::Fetcher;
use crate::ingest::collapse_ws;
use crate::ingest::types::{FeedEntry, TrendFeed};
use crate::types::ContextPayload;

/// Fused topics kept per snapshot.
const FEED_SLICE: usize = 20;

/// Shortest comparison key still considered a topic.
const MIN_KEY_LEN: usize = 2;

/// Single-word titles that are platform boilerplate, not topics.
static BANNED_SINGLE_WORD: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "official", "video", "ep", "mv", "trailer", "teaser", "shorts", "the", "of", "to", "with",
        "vs", "we", "me", "is", "in", "day",
    ]
    .into_iter()
    .collect()
});

/// Comparison key: whitespace-collapsed, case-folded.
fn normalize_key(title: &str) -> String {
    collapse_ws(title).to_lowercase()
}

fn should_skip_title(title: &str) -> bool {
    let normalized = normalize_key(title);
    if normalized.chars().count() < MIN_KEY_LEN {
        return true;
    }
    let mut parts = normalized.split(' ');
    let first = parts.next().unwrap_or_default();
    parts.next().is_none() && BANNED_SINGLE_WORD.contains(first)
}

#[derive(Debug, Deserialize)]
struct VideoListing {
    items: Vec<VideoRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoRecord {
    id: Option<String>,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoSnippet {
    title: Option<String>,
    channel_title: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VideoStatistics {
    view_count: Option<String>,
}

struct Fused {
    keyword: String,
    score: f64,
    channel_title: String,
    published_at: String,
    video_id: String,
    top_weight: f64,
}

/// Fuse the raw listing into ranked topics. A payload without an item array
/// is a parse error; individual records missing fields contribute what they
/// have (a missing view count weighs as zero views).
pub fn parse_listing(raw: &str) -> Result<Vec<FeedEntry>, TrendError> {
    let listing: VideoListing = serde_json::from_str(raw)
        .map_err(|e| TrendError::parse("youtube.mostPopular", e.to_string()))?;

    // Insertion order is the tie-break for equal fused scores.
    let mut order: Vec<Fused> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in listing.items {
        let snippet = record.snippet.unwrap_or_default();
        let raw_title = snippet.title.clone().unwrap_or_default();
        if should_skip_title(&raw_title) {
            continue;
        }

        let views: f64 = record
            .statistics
            .and_then(|s| s.view_count)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);
        let weight = 1.0 + (1.0 + views).log10();

        let key = normalize_key(&raw_title);
        let slot = *index.entry(key).or_insert_with(|| {
            order.push(Fused {
                keyword: raw_title.trim().to_string(),
                score: 0.0,
                channel_title: String::new(),
                published_at: String::new(),
                video_id: String::new(),
                top_weight: 0.0,
            });
            order.len() - 1
        });

        let fused = &mut order[slot];
        fused.score += weight;
        if weight > fused.top_weight {
            fused.channel_title = snippet.channel_title.unwrap_or_default();
            fused.published_at = snippet.published_at.unwrap_or_default();
            fused.video_id = record.id.unwrap_or_default();
            fused.top_weight = weight;
        }
    }

    order.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let entries = order
        .into_iter()
        .take(FEED_SLICE)
        .map(|fused| FeedEntry {
            keyword: fused.keyword,
            score: (fused.score * 1000.0).round() / 1000.0,
            context: Some(ContextPayload::Video {
                channel_title: fused.channel_title,
                published_at: fused.published_at,
                video_id: fused.video_id,
            }),
        })
        .collect();

    Ok(entries)
}

/// The platform's most-popular chart for one region. Single feed; the
/// cascade degenerates to one attempt.
#[derive(Debug)]
pub struct MostPopularFeed {
    fetcher: Fetcher,
    api_key: String,
}

impl MostPopularFeed {
    /// Rejects an empty key up front so no request is ever sent without one.
    pub fn new(fetcher: Fetcher, api_key: impl Into<String>) -> Result<Self, TrendError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(TrendError::MissingKey("YOUTUBE_API_KEY"));
        }
        Ok(Self { fetcher, api_key })
    }
}

#[async_trait]
impl TrendFeed for MostPopularFeed {
    async fn fetch(&self, geo: &str) -> Result<Vec<FeedEntry>, TrendError> {
        let url = format!(
            "https://www.googleapis.com/youtube/v3/videos?part=snippet%2Cstatistics&chart=mostPopular&maxResults=50&regionCode={}&key={}",
            geo, self.api_key
        );
        let body = self.fetcher.get_text(&url, HeaderMap::new()).await?;
        parse_listing(&body)
    }

    fn name(&self) -> &'static str {
        "youtube.mostPopular"
    }
}
