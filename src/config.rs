// src/config.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ingest::MergeLimits;

const ENV_PATH: &str = "TRENDS_CONFIG_PATH";

/// Runtime configuration. Policy constants (sufficiency threshold, windows,
/// retention) live here rather than in the algorithms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Region codes processed in order each cycle.
    pub geos: Vec<String>,
    pub data_dir: PathBuf,
    pub history: HistoryCfg,
    pub merge: MergeCfg,
    pub analytics: AnalyticsCfg,
    pub delay: DelayCfg,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HistoryCfg {
    pub retention_days: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MergeCfg {
    pub sufficiency: usize,
    pub max_items: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AnalyticsCfg {
    pub top_n: usize,
    /// Short window (hours) for the "most #1" board; also the rank-delta
    /// lookback.
    pub top_rank_window_hours: i64,
    pub top_rank_cutoff: usize,
    /// Long window (hours) for the longevity board.
    pub longevity_window_hours: i64,
}

/// Randomized pause between regions, to stay under upstream rate limits.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DelayCfg {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geos: vec!["US".into(), "KR".into(), "JP".into()],
            data_dir: PathBuf::from("data"),
            history: HistoryCfg::default(),
            merge: MergeCfg::default(),
            analytics: AnalyticsCfg::default(),
            delay: DelayCfg::default(),
        }
    }
}

impl Default for HistoryCfg {
    fn default() -> Self {
        Self {
            retention_days: crate::history::DEFAULT_RETENTION_DAYS,
        }
    }
}

impl Default for MergeCfg {
    fn default() -> Self {
        let limits = MergeLimits::default();
        Self {
            sufficiency: limits.sufficiency,
            max_items: limits.max_items,
        }
    }
}

impl Default for AnalyticsCfg {
    fn default() -> Self {
        Self {
            top_n: crate::analytics::DEFAULT_TOP_N,
            top_rank_window_hours: 24,
            top_rank_cutoff: 1,
            longevity_window_hours: 72,
        }
    }
}

impl Default for DelayCfg {
    fn default() -> Self {
        Self {
            min_ms: 300,
            max_ms: 500,
        }
    }
}

impl AppConfig {
    /// Load using env var + fallbacks:
    /// 1) $TRENDS_CONFIG_PATH
    /// 2) config/trends.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            return Self::load_from(&PathBuf::from(p));
        }
        let toml_p = PathBuf::from("config/trends.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn merge_limits(&self) -> MergeLimits {
        MergeLimits {
            sufficiency: self.merge.sufficiency,
            max_items: self.merge.max_items,
        }
    }
}

/// The video API key comes only from the environment and is never persisted.
pub fn youtube_api_key() -> Option<String> {
    std::env::var("YOUTUBE_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}
