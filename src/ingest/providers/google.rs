// src/ingest/providers/google.rs
//! Search-trends provider: three fallback feeds consulted in priority order
//! (realtime stories, daily searches, the public RSS). Each parser fails
//! closed: a missing nested section yields an empty list, and only a body
//! that is not the expected format at all is a parse error.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde::Deserialize;

use crate::error::TrendError;
use crate::fetch::Fetcher;
use crate::ingest::normalize_title;
use crate::ingest::types::{FeedEntry, TrendFeed};
use crate::types::{Article, ContextPayload};

/// Per-feed slice consumed by the cascade.
const FEED_SLICE: usize = 20;

/// Related articles kept per keyword.
const MAX_ARTICLES: usize = 2;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn locale_for(geo: &str) -> &'static str {
    match geo {
        "KR" => "ko-KR",
        "JP" => "ja-JP",
        _ => "en-US",
    }
}

/// The trends endpoints only answer browser-looking requests in the
/// region's locale.
fn feed_headers(geo: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    if let Ok(v) = HeaderValue::from_str(&format!("{},en;q=0.7", locale_for(geo))) {
        headers.insert(ACCEPT_LANGUAGE, v);
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers
}

/// Strip the anti-JSON-hijacking preamble (`)]}'` plus optional comma) the
/// JSON endpoints prepend to every response.
pub fn strip_magic_prefix(raw: &str) -> &str {
    match raw.strip_prefix(")]}'") {
        Some(rest) => rest.strip_prefix(',').unwrap_or(rest).trim_start(),
        None => raw,
    }
}

/// Parse a formatted traffic magnitude: `"1.2M+"` -> 1_200_000,
/// `"500K"` -> 500_000, `"1,200"` -> 1200. `None` when unparsable.
pub fn parse_traffic(raw: &str) -> Option<f64> {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"^(\d+(?:\.\d+)?)([KM]?)$").unwrap());

    let cleaned = raw.replace([',', '+'], "");
    let cleaned = cleaned.trim().to_ascii_uppercase();
    let caps = re.captures(&cleaned)?;
    let value: f64 = caps[1].parse().ok()?;
    let scaled = match caps.get(2).map(|m| m.as_str()) {
        Some("M") => value * 1_000_000.0,
        Some("K") => value * 1_000.0,
        _ => value,
    };
    Some(scaled.round())
}

/// Traffic when present and positive, otherwise a rank-derived fallback so
/// the list still carries a monotone score.
fn traffic_or_rank(raw: Option<&str>, idx: usize) -> f64 {
    raw.and_then(parse_traffic)
        .filter(|v| *v > 0.0)
        .unwrap_or((100 - idx) as f64)
}

#[derive(Debug, Default, Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

fn extract_articles(raw: &[RawArticle]) -> Vec<Article> {
    raw.iter()
        .filter_map(|a| {
            let title = a.title.as_deref().unwrap_or_default();
            let url = a.url.as_deref().unwrap_or_default();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(Article {
                title: title.to_string(),
                url: url.to_string(),
                source: a.source.clone().unwrap_or_default(),
            })
        })
        .take(MAX_ARTICLES)
        .collect()
}

// --- realtime stories ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealtimePayload {
    #[serde(default)]
    story_summaries: Option<StorySummaries>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorySummaries {
    #[serde(default)]
    trending_stories: Vec<Story>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Story {
    title: Option<String>,
    entity_names: Vec<String>,
    share_url: Option<String>,
    formatted_traffic: Option<String>,
    articles: Vec<RawArticle>,
}

fn share_url_keyword(url: Option<&str>) -> Option<String> {
    let last = url?.rsplit('/').next()?;
    let cleaned = last.replace('_', " ");
    (!cleaned.trim().is_empty()).then_some(cleaned)
}

pub fn parse_realtime(raw: &str) -> Result<Vec<FeedEntry>, TrendError> {
    let payload: RealtimePayload = serde_json::from_str(strip_magic_prefix(raw))
        .map_err(|e| TrendError::parse("google.realtime", e.to_string()))?;

    let stories = payload
        .story_summaries
        .map(|s| s.trending_stories)
        .unwrap_or_default();

    let entries = stories
        .into_iter()
        .take(FEED_SLICE)
        .enumerate()
        .filter_map(|(idx, story)| {
            let keyword = story
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .or_else(|| {
                    story
                        .entity_names
                        .first()
                        .cloned()
                        .filter(|n| !n.trim().is_empty())
                })
                .or_else(|| share_url_keyword(story.share_url.as_deref()))?;
            let keyword = normalize_title(&keyword);
            if keyword.is_empty() {
                return None;
            }
            let score = traffic_or_rank(story.formatted_traffic.as_deref(), idx);
            let articles = extract_articles(&story.articles);
            Some(FeedEntry {
                keyword,
                score,
                context: (!articles.is_empty()).then_some(ContextPayload::Articles { articles }),
            })
        })
        .collect();

    Ok(entries)
}

// --- daily searches ---

#[derive(Debug, Deserialize)]
struct DailyPayload {
    #[serde(default, rename = "default")]
    default_feed: Option<DailyDefault>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyDefault {
    #[serde(default)]
    trending_searches_days: Vec<DailyDay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DailyDay {
    trending_searches: Vec<DailySearch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DailySearch {
    title: Option<DailyTitle>,
    formatted_traffic: Option<String>,
    traffic_breakdown: Vec<TrafficBreakdown>,
    articles: Vec<RawArticle>,
}

/// The daily feed serves the title either as a bare string or wrapped in a
/// `{query}` object depending on endpoint version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DailyTitle {
    Text(String),
    Query {
        #[serde(default)]
        query: String,
    },
}

impl DailyTitle {
    fn into_keyword(self) -> String {
        match self {
            DailyTitle::Text(s) => s,
            DailyTitle::Query { query } => query,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrafficBreakdown {
    formatted_traffic: Option<String>,
}

pub fn parse_daily(raw: &str) -> Result<Vec<FeedEntry>, TrendError> {
    let payload: DailyPayload = serde_json::from_str(strip_magic_prefix(raw))
        .map_err(|e| TrendError::parse("google.daily", e.to_string()))?;

    let searches = payload
        .default_feed
        .and_then(|d| d.trending_searches_days.into_iter().next())
        .map(|day| day.trending_searches)
        .unwrap_or_default();

    let entries = searches
        .into_iter()
        .take(FEED_SLICE)
        .enumerate()
        .filter_map(|(idx, search)| {
            let raw_keyword = search
                .title
                .map(DailyTitle::into_keyword)
                .unwrap_or_default();
            let keyword = normalize_title(&raw_keyword);
            if keyword.is_empty() {
                return None;
            }
            let score = search
                .formatted_traffic
                .as_deref()
                .and_then(parse_traffic)
                .filter(|v| *v > 0.0)
                .or_else(|| {
                    search
                        .traffic_breakdown
                        .first()
                        .and_then(|b| b.formatted_traffic.as_deref())
                        .and_then(parse_traffic)
                        .filter(|v| *v > 0.0)
                })
                .unwrap_or((100 - idx) as f64);
            let articles = extract_articles(&search.articles);
            Some(FeedEntry {
                keyword,
                score,
                context: (!articles.is_empty()).then_some(ContextPayload::Articles { articles }),
            })
        })
        .collect();

    Ok(entries)
}

// --- public RSS ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
}

/// The RSS feed carries no traffic figures, so scores fall back to rank.
pub fn parse_rss(xml: &str) -> Result<Vec<FeedEntry>, TrendError> {
    let rss: Rss =
        quick_xml::de::from_str(xml).map_err(|e| TrendError::parse("google.rss", e.to_string()))?;

    let entries = rss
        .channel
        .item
        .into_iter()
        .take(FEED_SLICE)
        .enumerate()
        .filter_map(|(idx, item)| {
            let keyword = normalize_title(item.title.as_deref().unwrap_or_default());
            if keyword.is_empty() {
                return None;
            }
            Some(FeedEntry {
                keyword,
                score: (100 - idx) as f64,
                context: None,
            })
        })
        .collect();

    Ok(entries)
}

// --- HTTP feeds ---

/// Realtime trending stories; freshest and densest, consulted first.
pub struct RealtimeFeed {
    fetcher: Fetcher,
}

impl RealtimeFeed {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl TrendFeed for RealtimeFeed {
    async fn fetch(&self, geo: &str) -> Result<Vec<FeedEntry>, TrendError> {
        let url = format!(
            "https://trends.google.com/trends/api/realtimetrends?hl={}&tz=0&cat=all&fi=0&fs=0&geo={}&ri=300&rs=20&sort=0",
            locale_for(geo),
            geo
        );
        let body = self.fetcher.get_text(&url, feed_headers(geo)).await?;
        parse_realtime(&body)
    }

    fn name(&self) -> &'static str {
        "google.realtime"
    }
}

/// Daily trending searches; slower-moving, fills gaps left by realtime.
pub struct DailyFeed {
    fetcher: Fetcher,
}

impl DailyFeed {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl TrendFeed for DailyFeed {
    async fn fetch(&self, geo: &str) -> Result<Vec<FeedEntry>, TrendError> {
        let url = format!(
            "https://trends.google.com/trends/api/dailytrends?hl={}&geo={}&ns=15",
            locale_for(geo),
            geo
        );
        let body = self.fetcher.get_text(&url, feed_headers(geo)).await?;
        parse_daily(&body)
    }

    fn name(&self) -> &'static str {
        "google.daily"
    }
}

/// Public RSS; last resort, titles only.
pub struct RssFeed {
    fetcher: Fetcher,
}

impl RssFeed {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl TrendFeed for RssFeed {
    async fn fetch(&self, geo: &str) -> Result<Vec<FeedEntry>, TrendError> {
        let url = format!("https://trends.google.com/trending/rss?geo={geo}");
        let xml = self.fetcher.get_text(&url, feed_headers(geo)).await?;
        parse_rss(&xml)
    }

    fn name(&self) -> &'static str {
        "google.rss"
    }
}

/// The full fallback cascade for this provider, in priority order.
pub fn feeds(fetcher: &Fetcher) -> Vec<Box<dyn TrendFeed>> {
    vec![
        Box::new(RealtimeFeed::new(fetcher.clone())),
        Box::new(DailyFeed::new(fetcher.clone())),
        Box::new(RssFeed::new(fetcher.clone())),
    ]
}
