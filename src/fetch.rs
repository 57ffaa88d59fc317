// src/fetch.rs
use reqwest::header::HeaderMap;

use crate::error::TrendError;

/// Thin HTTP collaborator shared by every feed. Non-success statuses and
/// transport failures surface as typed errors; retrying is the caller's
/// decision, never done here.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch a URL body as text with the given request headers.
    pub async fn get_text(&self, url: &str, headers: HeaderMap) -> Result<String, TrendError> {
        let resp = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| TrendError::Transport {
                url: url.to_string(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TrendError::Status {
                url: url.to_string(),
                status,
            });
        }

        resp.text().await.map_err(|e| TrendError::Transport {
            url: url.to_string(),
            source: e,
        })
    }
}
