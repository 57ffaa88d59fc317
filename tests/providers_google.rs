// tests/providers_google.rs
// Fixture payloads for all three fallback feeds of the search provider.

use std::fs;

use trending_pulse::ingest::providers::google::{parse_daily, parse_realtime, parse_rss};
use trending_pulse::types::ContextPayload;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}")).expect("missing fixture")
}

#[test]
fn realtime_fixture_yields_ranked_entries() {
    let out = parse_realtime(&fixture("google_realtime.json")).expect("parse");

    let keywords: Vec<&str> = out.iter().map(|e| e.keyword.as_str()).collect();
    assert_eq!(
        keywords,
        vec![
            "City Marathon",
            "Storm Warning",
            "Space Launch",
            "Election Results"
        ]
    );

    // no traffic figure -> rank-derived fallback
    assert_eq!(out[0].score, 100.0);
    assert_eq!(out[1].score, 99.0);
    // share-url fallback keyword, underscores mapped to spaces
    assert_eq!(out[2].keyword, "Space Launch");
    // formatted traffic wins over rank
    assert_eq!(out[3].score, 1_500_000.0);
}

#[test]
fn realtime_fixture_caps_articles_and_drops_broken_ones() {
    let out = parse_realtime(&fixture("google_realtime.json")).expect("parse");

    match out[0].context.as_ref().expect("context") {
        ContextPayload::Articles { articles } => {
            assert_eq!(articles.len(), 2);
            assert_eq!(articles[0].title, "Marathon recap");
            assert_eq!(articles[1].title, "Winner interview");
        }
        other => panic!("unexpected context: {other:?}"),
    }
    // story with no usable articles carries no context at all
    assert!(out[1].context.is_none());
}

#[test]
fn daily_fixture_uses_only_the_first_day() {
    let out = parse_daily(&fixture("google_daily.json")).expect("parse");

    let keywords: Vec<&str> = out.iter().map(|e| e.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["transfer rumours", "heatwave", "mystery signal"]);
    assert!(!keywords.contains(&"yesterday topic"));
}

#[test]
fn daily_fixture_score_chain_traffic_breakdown_rank() {
    let out = parse_daily(&fixture("google_daily.json")).expect("parse");

    assert_eq!(out[0].score, 200_000.0); // formattedTraffic
    assert_eq!(out[1].score, 50_000.0); // trafficBreakdown fallback
    assert_eq!(out[2].score, 98.0); // unparsable -> 100 - idx
}

#[test]
fn rss_fixture_unwraps_cdata_and_decodes_entities() {
    let out = parse_rss(&fixture("google_trending.rss")).expect("parse");

    assert_eq!(out.len(), 2, "blank titles are skipped");
    assert_eq!(out[0].keyword, "Rock & Roll Hall");
    assert_eq!(out[0].score, 100.0);
    assert_eq!(out[1].keyword, "Quiet \"Launch\"");
    assert_eq!(out[1].score, 99.0);
}
