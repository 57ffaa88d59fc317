// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;

use crate::error::TrendError;
use crate::ingest::types::{FeedEntry, TrendFeed};
use crate::types::{
    to_iso, ContextDoc, ContextEntry, ContextPayload, Snapshot, Source, TrendBundle, TrendItem,
};

/// One-time metrics registration (so series show up on scrapes).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "trend_feed_entries_total",
            "Entries normalized from upstream feeds."
        );
        describe_counter!(
            "trend_feed_errors_total",
            "Feed fetch/parse errors swallowed by the cascade."
        );
        describe_counter!(
            "trend_snapshots_total",
            "Snapshots produced across providers and regions."
        );
        describe_histogram!("trend_feed_ms", "Feed fetch+normalize time in milliseconds.");
        describe_gauge!(
            "trend_cycle_last_run_ts",
            "Unix ts when the last aggregation cycle ran."
        );
    });
}

/// Limits for one merge: how many unique keywords count as "enough" to stop
/// consulting further fallback feeds, and how many survive into the snapshot.
#[derive(Clone, Copy, Debug)]
pub struct MergeLimits {
    pub sufficiency: usize,
    pub max_items: usize,
}

impl Default for MergeLimits {
    fn default() -> Self {
        Self {
            sufficiency: 20,
            max_items: 20,
        }
    }
}

/// Clean a feed title for use as a keyword: decode HTML entities, strip
/// markup, collapse whitespace. Case is preserved.
pub fn normalize_title(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());

    let decoded = html_escape::decode_html_entities(s);
    let stripped = re_tags.replace_all(decoded.as_ref(), "");
    collapse_ws(stripped.as_ref())
}

pub(crate) fn collapse_ws(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s.trim(), " ").into_owned()
}

/// Dedup key used while merging: whitespace-collapsed, case-sensitive.
/// Comparison only; the stored keyword is never mutated here.
fn merge_key(keyword: &str) -> String {
    collapse_ws(keyword)
}

/// Consult fallback feeds strictly in priority order, accumulating unique
/// keywords until the sufficiency threshold is met. Earlier feeds always win
/// ties; later feeds only fill gaps and never reorder or overwrite existing
/// entries. Fails with `NoData` (carrying the last feed error, if any) when
/// every feed failed or yielded nothing.
pub async fn merge_cascade(
    feeds: &[Box<dyn TrendFeed>],
    provider: Source,
    geo: &str,
    limits: MergeLimits,
) -> Result<(Vec<TrendItem>, HashMap<String, ContextPayload>), TrendError> {
    ensure_metrics_described();

    let mut items: Vec<TrendItem> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut context: HashMap<String, ContextPayload> = HashMap::new();
    let mut last_err: Option<TrendError> = None;

    for feed in feeds {
        if items.len() >= limits.sufficiency {
            break;
        }
        let t0 = std::time::Instant::now();
        match feed.fetch(geo).await {
            Ok(batch) => {
                histogram!("trend_feed_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                counter!("trend_feed_entries_total").increment(batch.len() as u64);
                merge_unique(&mut items, &mut seen, &mut context, batch);
            }
            Err(e) => {
                tracing::warn!(error = %e, feed = feed.name(), geo, "feed error");
                counter!("trend_feed_errors_total").increment(1);
                last_err = Some(e);
            }
        }
    }

    if items.is_empty() {
        return Err(TrendError::NoData {
            provider,
            geo: geo.to_string(),
            last: last_err.map(Box::new),
        });
    }

    items.truncate(limits.max_items);
    Ok((items, context))
}

fn merge_unique(
    items: &mut Vec<TrendItem>,
    seen: &mut HashSet<String>,
    context: &mut HashMap<String, ContextPayload>,
    batch: Vec<FeedEntry>,
) {
    for entry in batch {
        if entry.keyword.is_empty() {
            continue;
        }
        if !seen.insert(merge_key(&entry.keyword)) {
            continue;
        }
        if let Some(payload) = entry.context {
            context.insert(entry.keyword.clone(), payload);
        }
        items.push(TrendItem {
            keyword: entry.keyword,
            score: entry.score,
        });
    }
}

/// Run the cascade for one provider/region and wrap the merged list with
/// capture metadata into an immutable snapshot, plus the context document
/// aligned to the final item list.
pub async fn produce_snapshot(
    provider: Source,
    geo: &str,
    feeds: &[Box<dyn TrendFeed>],
    limits: MergeLimits,
    now: DateTime<Utc>,
) -> Result<TrendBundle, TrendError> {
    let (items, mut context) = merge_cascade(feeds, provider, geo, limits).await?;
    let captured_at = to_iso(now);

    let entries = items
        .iter()
        .map(|item| ContextEntry {
            keyword: item.keyword.clone(),
            payload: context
                .remove(&item.keyword)
                .unwrap_or(ContextPayload::Articles { articles: vec![] }),
        })
        .collect();

    counter!("trend_snapshots_total").increment(1);

    Ok(TrendBundle {
        snapshot: Snapshot {
            captured_at: captured_at.clone(),
            geo: geo.to_string(),
            source: provider,
            items,
        },
        context: ContextDoc {
            captured_at,
            geo: geo.to_string(),
            source: provider,
            items: entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(keyword: &str, score: f64) -> FeedEntry {
        FeedEntry {
            keyword: keyword.into(),
            score,
            context: None,
        }
    }

    #[test]
    fn normalize_title_decodes_and_collapses() {
        let s = "  <b>Rock &amp; Roll</b>\n  returns ";
        assert_eq!(normalize_title(s), "Rock & Roll returns");
    }

    #[test]
    fn normalize_title_keeps_case() {
        assert_eq!(normalize_title("Tour de France"), "Tour de France");
    }

    #[test]
    fn merge_unique_keeps_first_occurrence() {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut context = HashMap::new();

        merge_unique(
            &mut items,
            &mut seen,
            &mut context,
            vec![entry("alpha", 10.0), entry("beta", 9.0)],
        );
        merge_unique(
            &mut items,
            &mut seen,
            &mut context,
            vec![entry("alpha", 99.0), entry("gamma", 1.0)],
        );

        let keywords: Vec<&str> = items.iter().map(|i| i.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["alpha", "beta", "gamma"]);
        assert_eq!(items[0].score, 10.0);
    }

    #[test]
    fn merge_dedup_ignores_whitespace_differences_not_case() {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut context = HashMap::new();

        merge_unique(
            &mut items,
            &mut seen,
            &mut context,
            vec![
                entry("solar  eclipse", 5.0),
                entry("solar eclipse", 4.0),
                entry("Solar eclipse", 3.0),
            ],
        );

        let keywords: Vec<&str> = items.iter().map(|i| i.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["solar  eclipse", "Solar eclipse"]);
    }

    #[test]
    fn merge_unique_skips_empty_keywords() {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut context = HashMap::new();

        merge_unique(
            &mut items,
            &mut seen,
            &mut context,
            vec![entry("", 5.0), entry("real", 4.0)],
        );
        assert_eq!(items.len(), 1);
    }
}
