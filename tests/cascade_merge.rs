// tests/cascade_merge.rs
// Cascade behavior with mock feeds: dedup, short-circuit, fallback, NoData.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use trending_pulse::error::TrendError;
use trending_pulse::ingest::types::{FeedEntry, TrendFeed};
use trending_pulse::ingest::{merge_cascade, produce_snapshot, MergeLimits};
use trending_pulse::types::{Article, ContextPayload, Source};

struct StaticFeed {
    name: &'static str,
    entries: Vec<FeedEntry>,
    calls: Arc<AtomicUsize>,
}

impl StaticFeed {
    fn new(name: &'static str, entries: Vec<FeedEntry>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                entries,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl TrendFeed for StaticFeed {
    async fn fetch(&self, _geo: &str) -> Result<Vec<FeedEntry>, TrendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

struct FailingFeed;

#[async_trait]
impl TrendFeed for FailingFeed {
    async fn fetch(&self, _geo: &str) -> Result<Vec<FeedEntry>, TrendError> {
        Err(TrendError::parse("mock.failing", "not the expected shape"))
    }

    fn name(&self) -> &'static str {
        "mock.failing"
    }
}

fn entry(keyword: &str, score: f64) -> FeedEntry {
    FeedEntry {
        keyword: keyword.into(),
        score,
        context: None,
    }
}

fn entries(keywords: &[(&str, f64)]) -> Vec<FeedEntry> {
    keywords.iter().map(|(k, s)| entry(k, *s)).collect()
}

#[tokio::test]
async fn shared_keyword_keeps_first_feed_entry() {
    let (a, _) = StaticFeed::new("a", entries(&[("alpha", 10.0), ("beta", 9.0)]));
    let (b, _) = StaticFeed::new("b", entries(&[("alpha", 99.0), ("gamma", 1.0)]));
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(a), Box::new(b)];

    let (items, _) = merge_cascade(&feeds, Source::Google, "US", MergeLimits::default())
        .await
        .expect("merge");

    let keywords: Vec<&str> = items.iter().map(|i| i.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["alpha", "beta", "gamma"]);
    assert_eq!(items[0].score, 10.0);
}

#[tokio::test]
async fn sufficient_first_feed_short_circuits_the_rest() {
    let full: Vec<FeedEntry> = (0..20).map(|i| entry(&format!("kw{i}"), 1.0)).collect();
    let (a, _) = StaticFeed::new("a", full);
    let (b, b_calls) = StaticFeed::new("b", entries(&[("never", 1.0)]));
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(a), Box::new(b)];

    let (items, _) = merge_cascade(&feeds, Source::Google, "US", MergeLimits::default())
        .await
        .expect("merge");

    assert_eq!(items.len(), 20);
    assert_eq!(b_calls.load(Ordering::SeqCst), 0, "feed b must not be hit");
}

#[tokio::test]
async fn sparse_first_feed_pulls_in_fallbacks() {
    let (a, a_calls) = StaticFeed::new("a", entries(&[("one", 3.0)]));
    let (b, b_calls) = StaticFeed::new("b", entries(&[("two", 2.0), ("one", 9.0)]));
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(a), Box::new(b)];

    let (items, _) = merge_cascade(&feeds, Source::Google, "US", MergeLimits::default())
        .await
        .expect("merge");

    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn failing_feed_falls_through_to_next() {
    let (b, _) = StaticFeed::new("b", entries(&[("rescued", 1.0)]));
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(FailingFeed), Box::new(b)];

    let (items, _) = merge_cascade(&feeds, Source::Google, "US", MergeLimits::default())
        .await
        .expect("merge");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].keyword, "rescued");
}

#[tokio::test]
async fn all_feeds_failing_is_no_data_with_last_error() {
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(FailingFeed), Box::new(FailingFeed)];

    let err = merge_cascade(&feeds, Source::Google, "KR", MergeLimits::default())
        .await
        .unwrap_err();

    match err {
        TrendError::NoData {
            provider,
            geo,
            last,
        } => {
            assert_eq!(provider, Source::Google);
            assert_eq!(geo, "KR");
            assert!(matches!(*last.expect("last error"), TrendError::Parse { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn all_feeds_empty_is_no_data_without_last_error() {
    let (a, _) = StaticFeed::new("a", vec![]);
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(a)];

    let err = merge_cascade(&feeds, Source::Youtube, "JP", MergeLimits::default())
        .await
        .unwrap_err();

    match err {
        TrendError::NoData { last, .. } => assert!(last.is_none()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn output_is_capped_in_accumulation_order() {
    let first: Vec<FeedEntry> = (0..15).map(|i| entry(&format!("a{i}"), 1.0)).collect();
    let second: Vec<FeedEntry> = (0..10).map(|i| entry(&format!("b{i}"), 1.0)).collect();
    let (a, _) = StaticFeed::new("a", first);
    let (b, _) = StaticFeed::new("b", second);
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(a), Box::new(b)];

    let (items, _) = merge_cascade(&feeds, Source::Google, "US", MergeLimits::default())
        .await
        .expect("merge");

    assert_eq!(items.len(), 20);
    assert_eq!(items[0].keyword, "a0");
    assert_eq!(items[14].keyword, "a14");
    assert_eq!(items[15].keyword, "b0");
    assert_eq!(items[19].keyword, "b4");
}

#[tokio::test]
async fn snapshot_carries_metadata_and_aligned_context() {
    let article = Article {
        title: "coverage".into(),
        url: "https://news.example/c".into(),
        source: "Wire".into(),
    };
    let with_context = FeedEntry {
        keyword: "covered".into(),
        score: 5.0,
        context: Some(ContextPayload::Articles {
            articles: vec![article.clone()],
        }),
    };
    let (a, _) = StaticFeed::new("a", vec![with_context, entry("bare", 4.0)]);
    let feeds: Vec<Box<dyn TrendFeed>> = vec![Box::new(a)];

    let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
    let bundle = produce_snapshot(Source::Google, "US", &feeds, MergeLimits::default(), now)
        .await
        .expect("bundle");

    assert_eq!(bundle.snapshot.captured_at, "2026-08-06T12:00:00.000Z");
    assert_eq!(bundle.snapshot.geo, "US");
    assert_eq!(bundle.snapshot.source, Source::Google);
    assert_eq!(bundle.context.captured_at, bundle.snapshot.captured_at);

    assert_eq!(bundle.context.items.len(), bundle.snapshot.items.len());
    assert_eq!(bundle.context.items[0].keyword, "covered");
    assert_eq!(
        bundle.context.items[0].payload,
        ContextPayload::Articles {
            articles: vec![article]
        }
    );
    // keywords without context still get an aligned, empty entry
    assert_eq!(
        bundle.context.items[1].payload,
        ContextPayload::Articles { articles: vec![] }
    );
}
