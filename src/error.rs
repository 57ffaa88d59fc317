// src/error.rs
use crate::types::Source;

/// Failure taxonomy for the aggregation core.
///
/// Feed-level errors (`Status`, `Transport`, `Parse`) are swallowed by the
/// cascade and only surface as `NoData` when every fallback feed for one
/// provider/region failed or came back empty. Corrupt history is never an
/// error; it is repaired on read.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    /// Non-success HTTP status from an upstream feed.
    #[error("request failed {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Connect/read failure before a response body was obtained.
    #[error("transport error for {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Payload did not match the expected shape at all. The feed is treated
    /// as empty by the cascade; never fatal on its own.
    #[error("unexpected {feed} payload: {reason}")]
    Parse { feed: &'static str, reason: String },

    /// Every fallback feed for one provider/region failed or was empty.
    /// Fatal for that provider/region cycle only.
    #[error("no trend data for {provider}/{geo}")]
    NoData {
        provider: Source,
        geo: String,
        #[source]
        last: Option<Box<TrendError>>,
    },

    /// A required credential is absent from the environment.
    #[error("{0} is missing")]
    MissingKey(&'static str),
}

impl TrendError {
    pub fn parse(feed: &'static str, reason: impl Into<String>) -> Self {
        TrendError::Parse {
            feed,
            reason: reason.into(),
        }
    }
}
