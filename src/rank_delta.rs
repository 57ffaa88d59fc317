// src/rank_delta.rs
//! Ordinal movement between the current ranking and the closest historical
//! snapshot. Labels reflect position only, never score: a keyword that
//! doubled its traffic but stayed at #3 is `"0"`.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::history;
use crate::types::{History, TrendItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Same,
}

/// Derived per-keyword movement; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankChange {
    pub label: String,
    pub direction: Direction,
}

impl RankChange {
    fn new_entry() -> Self {
        Self {
            label: "NEW".to_string(),
            direction: Direction::Up,
        }
    }

    fn from_delta(delta: i64) -> Self {
        if delta > 0 {
            Self {
                label: format!("+{delta}"),
                direction: Direction::Up,
            }
        } else if delta < 0 {
            Self {
                label: format!("-{}", delta.abs()),
                direction: Direction::Down,
            }
        } else {
            Self {
                label: "0".to_string(),
                direction: Direction::Same,
            }
        }
    }
}

/// Map each current keyword to its movement versus the snapshot closest to
/// `now - hours_ago`. A keyword absent from the reference is `NEW`; positive
/// deltas mean it moved toward #1.
pub fn annotate(
    items: &[TrendItem],
    history: &History,
    hours_ago: i64,
    now: DateTime<Utc>,
) -> HashMap<String, RankChange> {
    let target = now - Duration::hours(hours_ago);
    let reference = history::find_closest(history, target)
        .map(|snap| snap.items.as_slice())
        .unwrap_or(&[]);
    let rank_map = build_rank_map(reference);

    let mut out = HashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let current = (idx + 1) as i64;
        let change = match rank_map.get(item.keyword.as_str()) {
            None => RankChange::new_entry(),
            Some(&previous) => RankChange::from_delta(previous as i64 - current),
        };
        out.insert(item.keyword.clone(), change);
    }
    out
}

/// 1-based keyword -> position lookup.
fn build_rank_map(items: &[TrendItem]) -> HashMap<&str, usize> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| (item.keyword.as_str(), idx + 1))
        .collect()
}
