// src/store.rs
//! JSON persistence collaborator: one pretty-printed file per
//! (kind, source, region). A corrupt file is repaired on read by behaving
//! like a missing one, so historical damage never blocks a new cycle.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::types::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Latest,
    History,
    Context,
}

impl FileKind {
    fn prefix(self) -> &'static str {
        match self {
            FileKind::Latest => "latest",
            FileKind::History => "history",
            FileKind::Context => "context",
        }
    }
}

/// `latest_google_US.json`, `history_youtube_JP.json`, ...
pub fn data_path(dir: &Path, kind: FileKind, source: Source, geo: &str) -> PathBuf {
    dir.join(format!("{}_{}_{}.json", kind.prefix(), source, geo))
}

/// Missing file -> `None`. Unreadable or corrupt content -> `None` with a
/// warning.
pub async fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable data file, starting fresh");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt data file, starting fresh");
            None
        }
    }
}

/// Pretty-printed JSON with a trailing newline; parent directories are
/// created as needed.
pub async fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut data = serde_json::to_string_pretty(value).context("serializing json")?;
    data.push('\n');
    fs::write(path, data)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
