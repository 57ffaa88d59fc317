// src/history.rs
//! # History Store
//! Append-only, retention-windowed time series of snapshots per
//! (source, region) pair, with nearest-snapshot-to-timestamp queries.
//!
//! Every function is pure and takes the clock as an argument, so retention
//! and window math are fully unit-testable. Corrupted entries (unparseable
//! timestamps) are dropped silently on append; historical damage must never
//! block ingestion of new data.

use chrono::{DateTime, Duration, Utc};

use crate::types::{History, Snapshot};

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 4;

/// Append one snapshot, compacting the sequence: entries with unparseable
/// timestamps or older than `now - retention_days` are dropped, an entry
/// with the same `captured_at` is replaced (never duplicated), and the
/// result is sorted ascending by capture time. This is the only mutator and
/// is idempotent for repeated appends of the same `captured_at`.
pub fn append(
    history: History,
    snapshot: Snapshot,
    retention_days: i64,
    now: DateTime<Utc>,
) -> History {
    let cutoff = now - Duration::days(retention_days);
    let geo = snapshot.geo.clone();
    let source = snapshot.source;

    let mut kept: Vec<Snapshot> = history
        .snapshots
        .into_iter()
        .filter(|snap| match snap.captured_ts() {
            Some(ts) => ts >= cutoff && snap.captured_at != snapshot.captured_at,
            None => false,
        })
        .collect();
    kept.push(snapshot);
    kept.sort_by_cached_key(|snap| snap.captured_ts());

    History {
        geo,
        source,
        snapshots: kept,
    }
}

/// The snapshot whose capture time is nearest to `target`. Linear scan;
/// unparseable timestamps are skipped; ties keep the first-encountered
/// snapshot in stored (ascending) order. `None` when nothing qualifies.
pub fn find_closest(history: &History, target: DateTime<Utc>) -> Option<&Snapshot> {
    let mut best: Option<(&Snapshot, Duration)> = None;
    for snap in &history.snapshots {
        let Some(ts) = snap.captured_ts() else {
            continue;
        };
        let diff = (ts - target).abs();
        match best {
            Some((_, min)) if diff >= min => {}
            _ => best = Some((snap, diff)),
        }
    }
    best.map(|(snap, _)| snap)
}

/// Snapshots captured within `window` of `now`, preserving stored order.
/// The analytics windows (24h/72h) are cut with this.
pub fn within_window(history: &History, now: DateTime<Utc>, window: Duration) -> Vec<&Snapshot> {
    history
        .snapshots
        .iter()
        .filter(|snap| {
            snap.captured_ts()
                .map(|ts| now - ts < window)
                .unwrap_or(false)
        })
        .collect()
}
