// src/pipeline.rs
//! Per-region update cycle: produce a snapshot for each provider, persist
//! latest/history/context, and log the derived movement, overlap, and
//! leaderboard report. A provider failure is logged and skipped; it never
//! aborts the other provider or other regions.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use metrics::gauge;

use crate::analytics;
use crate::config::AppConfig;
use crate::error::TrendError;
use crate::fetch::Fetcher;
use crate::history;
use crate::ingest;
use crate::ingest::providers::{google, youtube::MostPopularFeed};
use crate::ingest::types::TrendFeed;
use crate::overlap;
use crate::rank_delta;
use crate::store::{self, FileKind};
use crate::types::{History, Snapshot, Source, TrendBundle};

/// Run one provider for one region: cascade, then persist latest, compacted
/// history, and context. Returns the fresh snapshot with its updated history.
async fn run_provider(
    cfg: &AppConfig,
    feeds: &[Box<dyn TrendFeed>],
    source: Source,
    geo: &str,
    now: DateTime<Utc>,
) -> Result<(Snapshot, History)> {
    let bundle = ingest::produce_snapshot(source, geo, feeds, cfg.merge_limits(), now).await?;
    let TrendBundle { snapshot, context } = bundle;

    let latest_path = store::data_path(&cfg.data_dir, FileKind::Latest, source, geo);
    store::write_json_pretty(&latest_path, &snapshot).await?;

    let history_path = store::data_path(&cfg.data_dir, FileKind::History, source, geo);
    let existing = store::read_json_if_exists::<History>(&history_path)
        .await
        .unwrap_or_else(|| History::empty(source, geo));
    let updated = history::append(existing, snapshot.clone(), cfg.history.retention_days, now);
    store::write_json_pretty(&history_path, &updated).await?;

    let context_path = store::data_path(&cfg.data_dir, FileKind::Context, source, geo);
    store::write_json_pretty(&context_path, &context).await?;

    Ok((snapshot, updated))
}

fn build_feeds(fetcher: &Fetcher, source: Source) -> Result<Vec<Box<dyn TrendFeed>>, TrendError> {
    match source {
        Source::Google => Ok(google::feeds(fetcher)),
        Source::Youtube => {
            let key = crate::config::youtube_api_key()
                .ok_or(TrendError::MissingKey("YOUTUBE_API_KEY"))?;
            Ok(vec![Box::new(MostPopularFeed::new(fetcher.clone(), key)?)])
        }
    }
}

/// Log the derived report for one fresh snapshot: new entries versus the
/// closest reference, plus both leaderboards.
fn report(cfg: &AppConfig, snapshot: &Snapshot, history: &History, now: DateTime<Utc>) {
    let changes = rank_delta::annotate(
        &snapshot.items,
        history,
        cfg.analytics.top_rank_window_hours,
        now,
    );
    let fresh = changes.values().filter(|c| c.label == "NEW").count();

    let short = history::within_window(
        history,
        now,
        Duration::hours(cfg.analytics.top_rank_window_hours),
    );
    let top_ranked = analytics::top_rankers(
        &short,
        Some(cfg.analytics.top_rank_cutoff),
        cfg.analytics.top_n,
    );

    let long = history::within_window(
        history,
        now,
        Duration::hours(cfg.analytics.longevity_window_hours),
    );
    let longest = analytics::top_rankers(&long, None, cfg.analytics.top_n);

    tracing::info!(
        source = %snapshot.source,
        geo = %snapshot.geo,
        items = snapshot.items.len(),
        fresh,
        front_runner = top_ranked.first().map(|e| e.keyword.as_str()).unwrap_or("-"),
        long_runner = longest.first().map(|e| e.keyword.as_str()).unwrap_or("-"),
        "snapshot captured"
    );
}

/// Process both providers for one region.
pub async fn run_geo_cycle(cfg: &AppConfig, fetcher: &Fetcher, geo: &str, now: DateTime<Utc>) {
    let mut latest: HashMap<Source, Snapshot> = HashMap::new();

    for source in [Source::Google, Source::Youtube] {
        let feeds = match build_feeds(fetcher, source) {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::error!(%source, geo, error = %e, "provider unavailable, skipping");
                continue;
            }
        };
        match run_provider(cfg, &feeds, source, geo, now).await {
            Ok((snapshot, updated)) => {
                report(cfg, &snapshot, &updated, now);
                latest.insert(source, snapshot);
            }
            Err(e) => {
                tracing::error!(%source, geo, error = %e, "provider cycle failed, skipping");
            }
        }
    }

    if let (Some(current), Some(counterpart)) = (
        latest.get(&Source::Google),
        latest.get(&Source::Youtube),
    ) {
        let cross = overlap::cross_source_set(counterpart);
        let shared = current
            .items
            .iter()
            .filter(|item| cross.contains(&item.keyword))
            .count();
        tracing::info!(geo, shared, "keywords trending on both sources");
    }

    gauge!("trend_cycle_last_run_ts").set(now.timestamp() as f64);
}
