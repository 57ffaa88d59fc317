// src/overlap.rs
//! Cross-source overlap: keywords that also appear in the counterpart
//! provider's current top list for the same region. No fuzzy matching; a
//! keyword counts only when it is byte-identical.

use std::collections::HashSet;

use crate::types::Snapshot;

/// Counterpart keywords considered for overlap.
const TOP_N: usize = 20;

/// The counterpart snapshot's top-20 keywords as a membership set.
pub fn cross_source_set(counterpart: &Snapshot) -> HashSet<String> {
    counterpart
        .items
        .iter()
        .take(TOP_N)
        .map(|item| item.keyword.clone())
        .collect()
}
