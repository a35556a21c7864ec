//! Novig prediction-market listings.
//!
//! Endpoint: GET {base}/events[/{league}]?limit=N
//! Each event lists options with decimal odds, sometimes sent as strings.

use super::types::*;
use super::{build_client, get_json, parse_records, MarketSource};
use crate::engine::validation::validate_decimal_odds;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub struct NovigSource {
    client: Client,
    base_url: String,
}

/// Map our sport tag to the Novig league path segment.
fn novig_league(sport: &str) -> Option<&'static str> {
    match sport {
        "NBA" => Some("nba"),
        "NFL" => Some("nfl"),
        "NHL" => Some("nhl"),
        "MLB" => Some("mlb"),
        _ => None,
    }
}

// ── Novig JSON response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NovigEventsResponse {
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct NovigEvent {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    options: Vec<NovigOption>,
}

#[derive(Debug, Deserialize)]
struct NovigOption {
    name: Option<String>,
    #[serde(default)]
    odds: NovigOdds,
}

#[derive(Debug, Deserialize, Default)]
struct NovigOdds {
    decimal: Option<serde_json::Value>,
}

// ── Parsing ───────────────────────────────────────────────────────────

/// Decimal odds from a number or numeric string; anything <= 1.0 is not a usable price.
fn parse_decimal(value: &serde_json::Value) -> Option<f64> {
    let d = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    match validate_decimal_odds("decimal", d) {
        Ok(()) => Some(d),
        Err(e) => {
            tracing::debug!(error = %e, "skipping Novig option");
            None
        }
    }
}

fn event_to_listing(event: NovigEvent, sport: &str) -> Option<GameListing> {
    let outcomes: Vec<Outcome> = event
        .options
        .into_iter()
        .filter_map(|opt| {
            let decimal_odds = opt.odds.decimal.as_ref().and_then(parse_decimal)?;
            Some(Outcome {
                name: opt.name.unwrap_or_else(|| "Unknown".to_string()),
                decimal_odds,
            })
        })
        .collect();

    if outcomes.is_empty() {
        return None;
    }

    Some(GameListing {
        source: SourceId::Novig,
        game_id: event.id.map(|id| id.to_string()).unwrap_or_default(),
        display_name: event.title,
        teams: None,
        sport: sport.to_string(),
        closed: event.status != "open",
        outcomes,
    })
}

fn events_to_listings(raw: Vec<serde_json::Value>, sport: Option<&str>) -> Vec<GameListing> {
    let sport = sport.unwrap_or("Unknown");
    parse_records::<NovigEvent>(SourceId::Novig, raw)
        .into_iter()
        .filter_map(|e| event_to_listing(e, sport))
        .collect()
}

/// Parse a Novig `/events` body into listings.
/// Public for unit testing with fixtures.
pub fn parse_novig_events(json: &str, sport: Option<&str>) -> Result<Vec<GameListing>> {
    let resp: NovigEventsResponse =
        serde_json::from_str(json).context("failed to parse Novig JSON")?;
    Ok(events_to_listings(resp.events, sport))
}

impl NovigSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn events_url(&self, sport: Option<&str>) -> String {
        match sport.and_then(novig_league) {
            Some(league) => format!("{}/events/{}", self.base_url, league),
            None => format!("{}/events", self.base_url),
        }
    }
}

#[async_trait]
impl MarketSource for NovigSource {
    fn source(&self) -> SourceId {
        SourceId::Novig
    }

    async fn fetch_upcoming_games(
        &self,
        sport: Option<&str>,
        limit: usize,
    ) -> Result<Vec<GameListing>> {
        let url = self.events_url(sport);
        let resp: NovigEventsResponse = get_json(
            self.client.get(&url).query(&[("limit", limit)]),
            SourceId::Novig,
        )
        .await?;

        Ok(events_to_listings(resp.events, sport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "events": [
            {"id": "nv-1", "title": "Lakers vs Celtics", "status": "open",
             "options": [
                {"name": "Lakers", "odds": {"decimal": 1.85}},
                {"name": "Celtics", "odds": {"decimal": "2.15"}},
                {"name": "Bad", "odds": {"decimal": "n/a"}}
             ]},
            {"id": "nv-2", "title": "Knicks vs Nets", "status": "suspended",
             "options": [{"name": "Knicks", "odds": {"decimal": 1.5}}]},
            {"id": "nv-3", "title": "No usable options", "status": "open",
             "options": [{"name": "X", "odds": {}}, {"odds": {"decimal": 0}}]},
            {"id": "nv-4", "title": "Unnamed option", "status": "open",
             "options": [{"odds": {"decimal": 3.2}}]},
            {"id": "nv-5", "title": "Broken options", "status": "open",
             "options": "not-a-list"}
        ]
    }"#;

    #[test]
    fn test_parse_fixture() {
        let listings = parse_novig_events(FIXTURE, Some("NBA")).unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.game_id.as_str()).collect();
        assert_eq!(ids, vec!["nv-1", "nv-2", "nv-4"]);

        let first = &listings[0];
        assert_eq!(first.source, SourceId::Novig);
        assert_eq!(first.outcomes.len(), 2);
        assert_eq!(first.outcomes[1].name, "Celtics");
        assert!((first.outcomes[1].decimal_odds - 2.15).abs() < 1e-9);
        assert_eq!(first.best_decimal_odds(), Some(2.15));
    }

    #[test]
    fn test_non_open_status_is_closed() {
        let listings = parse_novig_events(FIXTURE, Some("NBA")).unwrap();
        assert!(!listings[0].closed);
        assert!(listings[1].closed);
    }

    #[test]
    fn test_unnamed_option_defaults() {
        let listings = parse_novig_events(FIXTURE, None).unwrap();
        let unnamed = listings.iter().find(|l| l.game_id == "nv-4").unwrap();
        assert_eq!(unnamed.outcomes[0].name, "Unknown");
        assert_eq!(unnamed.sport, "Unknown");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(&serde_json::json!(2.5)), Some(2.5));
        assert_eq!(parse_decimal(&serde_json::json!(" 1.9 ")), Some(1.9));
        assert_eq!(parse_decimal(&serde_json::json!(1.0)), None);
        assert_eq!(parse_decimal(&serde_json::json!("abc")), None);
        assert_eq!(parse_decimal(&serde_json::json!("inf")), None);
        assert_eq!(parse_decimal(&serde_json::json!("0.5")), None);
        assert_eq!(parse_decimal(&serde_json::json!(null)), None);
    }

    #[test]
    fn test_numeric_event_id() {
        let json = r#"{"events": [{"id": 991, "title": "Jets vs Bills", "status": "open",
            "options": [{"name": "Jets", "odds": {"decimal": "2.4"}}]}]}"#;
        let listings = parse_novig_events(json, Some("NFL")).unwrap();
        assert_eq!(listings[0].game_id, "991");
    }

    #[test]
    fn test_events_url() {
        let src = NovigSource::new("https://api.novig.com/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(src.events_url(Some("NHL")), "https://api.novig.com/v1/events/nhl");
        assert_eq!(src.events_url(Some("EPL")), "https://api.novig.com/v1/events");
        assert_eq!(src.events_url(None), "https://api.novig.com/v1/events");
    }
}
