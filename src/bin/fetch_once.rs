//! One-shot debug fetch: print a single provider/region snapshot as JSON.
//! Usage: fetch_once <google|youtube> <GEO>

use anyhow::{bail, Result};
use chrono::Utc;

use trending_pulse::config::{self, AppConfig};
use trending_pulse::fetch::Fetcher;
use trending_pulse::ingest;
use trending_pulse::ingest::providers::{google, youtube::MostPopularFeed};
use trending_pulse::ingest::types::TrendFeed;
use trending_pulse::types::Source;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let mut args = std::env::args().skip(1);
    let (Some(source_arg), Some(geo)) = (args.next(), args.next()) else {
        bail!("usage: fetch_once <google|youtube> <GEO>");
    };

    let cfg = AppConfig::load_default()?;
    let fetcher = Fetcher::new();

    let (source, feeds): (Source, Vec<Box<dyn TrendFeed>>) = match source_arg.as_str() {
        "google" => (Source::Google, google::feeds(&fetcher)),
        "youtube" => {
            let key = config::youtube_api_key().unwrap_or_default();
            (
                Source::Youtube,
                vec![Box::new(MostPopularFeed::new(fetcher.clone(), key)?)],
            )
        }
        other => bail!("unknown source {other}"),
    };

    let bundle = ingest::produce_snapshot(source, &geo, &feeds, cfg.merge_limits(), Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&bundle.snapshot)?);
    Ok(())
}
