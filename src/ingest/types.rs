// src/ingest/types.rs
use crate::error::TrendError;
use crate::types::ContextPayload;

/// Uniform normalized output of one feed: ranked entries, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub keyword: String,
    pub score: f64,
    pub context: Option<ContextPayload>,
}

/// One fallible upstream feed. Feeds for a provider are consulted in
/// priority order by the cascade; a failing feed contributes nothing.
#[async_trait::async_trait]
pub trait TrendFeed: Send + Sync {
    /// Fetch and normalize this feed for one region.
    async fn fetch(&self, geo: &str) -> Result<Vec<FeedEntry>, TrendError>;
    fn name(&self) -> &'static str;
}
