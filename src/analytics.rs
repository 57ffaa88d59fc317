// src/analytics.rs
//! Frequency leaderboards over a window of snapshots: how often a keyword
//! held a top rank ("most #1") and how long it stayed on the board at all
//! ("longest trending"). Both are the same count, differing only in the
//! window and rank cutoff the caller supplies.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::Snapshot;

/// Default leaderboard size.
pub const DEFAULT_TOP_N: usize = 5;

/// Derived leaderboard row; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEntry {
    pub keyword: String,
    pub count: usize,
}

/// Count, per keyword, the snapshots where it appears within the first
/// `rank_cutoff` positions (all positions when `None`) and return the top
/// `top_n` by count descending. Ties keep first-seen scan order, not
/// alphabetical.
pub fn top_rankers(
    snapshots: &[&Snapshot],
    rank_cutoff: Option<usize>,
    top_n: usize,
) -> Vec<AnalyticsEntry> {
    let mut order: Vec<AnalyticsEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for snap in snapshots {
        let cutoff = rank_cutoff.unwrap_or(snap.items.len());
        for item in snap.items.iter().take(cutoff) {
            match index.get(item.keyword.as_str()) {
                Some(&slot) => order[slot].count += 1,
                None => {
                    index.insert(item.keyword.clone(), order.len());
                    order.push(AnalyticsEntry {
                        keyword: item.keyword.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    // stable sort: equal counts keep first-seen order
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(top_n);
    order
}
