//! Trending Pulse — Binary Entrypoint
//! Runs one aggregation cycle: every region sequentially, both providers,
//! with a randomized delay between regions to stay under upstream rate
//! limits. Persisted output is consumed by the rendering layer.

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trending_pulse::config::AppConfig;
use trending_pulse::fetch::Fetcher;
use trending_pulse::pipeline;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trending_pulse=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    let fetcher = Fetcher::new();

    for (i, geo) in cfg.geos.iter().enumerate() {
        pipeline::run_geo_cycle(&cfg, &fetcher, geo, Utc::now()).await;
        if i + 1 < cfg.geos.len() {
            let ms = rand::rng().random_range(cfg.delay.min_ms..=cfg.delay.max_ms);
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
    }

    tracing::info!(regions = cfg.geos.len(), "cycle complete");
    Ok(())
}
