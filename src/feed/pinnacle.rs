//! Pinnacle sharp sportsbook fixtures.
//!
//! Endpoint: GET {base}/fixtures?sportId=N
//! Moneylines arrive as American odds; listings carry them as decimal.

use super::types::*;
use super::{build_client, get_json, parse_records, MarketSource};
use crate::engine::odds::american_to_decimal;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Away moneyline assumed when a fixture omits it.
const DEFAULT_AWAY_MONEYLINE: f64 = -110.0;

pub struct PinnacleSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Map our sport tag to the Pinnacle sport id.
pub fn pinnacle_sport_id(sport: &str) -> Option<u32> {
    match sport {
        "NBA" => Some(1),
        "NFL" => Some(2),
        "NHL" => Some(3),
        "MLB" => Some(4),
        _ => None,
    }
}

fn sport_name(sport_id: u32) -> &'static str {
    match sport_id {
        1 => "NBA",
        2 => "NFL",
        3 => "NHL",
        4 => "MLB",
        23 => "NCAA Basketball",
        25 => "NCAA Football",
        _ => "Unknown",
    }
}

// ── Pinnacle JSON response types ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PinnacleFixturesResponse {
    #[serde(default)]
    fixtures: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PinnacleFixture {
    id: RawId,
    #[serde(default)]
    away: PinnacleTeam,
    #[serde(default)]
    home: PinnacleTeam,
    #[serde(default)]
    moneyline: PinnacleMoneyline,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PinnacleTeam {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct PinnacleMoneyline {
    away: Option<f64>,
    home: Option<f64>,
}

// ── Parsing ───────────────────────────────────────────────────────────

fn usable_moneyline(american: f64) -> bool {
    american != 0.0 && american.is_finite()
}

fn moneyline_outcome(name: &str, american: f64) -> Option<Outcome> {
    if !usable_moneyline(american) {
        return None;
    }
    Some(Outcome {
        name: name.to_string(),
        decimal_odds: american_to_decimal(american),
    })
}

fn fixture_to_listing(fixture: PinnacleFixture, sport_id: u32) -> Option<GameListing> {
    if fixture.status.as_deref() == Some("closed") {
        return None;
    }

    let away_name = fixture.away.name;
    let home_name = fixture.home.name;

    // Away side first: it is the reference price a merged record carries.
    // An unusable away price counts as missing.
    let away_line = match fixture.moneyline.away {
        Some(a) if usable_moneyline(a) => a,
        Some(a) => {
            tracing::warn!(
                fixture = %fixture.id,
                away = a,
                "unusable Pinnacle away moneyline, using default"
            );
            DEFAULT_AWAY_MONEYLINE
        }
        None => DEFAULT_AWAY_MONEYLINE,
    };
    let outcomes: Vec<Outcome> = [
        moneyline_outcome(&away_name, away_line),
        fixture
            .moneyline
            .home
            .and_then(|h| moneyline_outcome(&home_name, h)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if outcomes.is_empty() {
        return None;
    }

    let display_name = if away_name.is_empty() && home_name.is_empty() {
        String::new()
    } else {
        format!("{} @ {}", away_name, home_name)
    };

    Some(GameListing {
        source: SourceId::Pinnacle,
        game_id: format!("pinnacle_{}", fixture.id),
        display_name,
        teams: Some(Matchup {
            away: away_name,
            home: home_name,
        }),
        sport: sport_name(sport_id).to_string(),
        closed: false,
        outcomes,
    })
}

fn fixtures_to_listings(
    mut raw: Vec<serde_json::Value>,
    sport_id: u32,
    limit: usize,
) -> Vec<GameListing> {
    raw.truncate(limit);
    parse_records::<PinnacleFixture>(SourceId::Pinnacle, raw)
        .into_iter()
        .filter_map(|f| fixture_to_listing(f, sport_id))
        .collect()
}

/// Parse a Pinnacle `/fixtures` body into open listings, keeping at most `limit` fixtures.
/// Public for unit testing with fixtures.
pub fn parse_pinnacle_fixtures(json: &str, sport_id: u32, limit: usize) -> Result<Vec<GameListing>> {
    let resp: PinnacleFixturesResponse =
        serde_json::from_str(json).context("failed to parse Pinnacle JSON")?;
    Ok(fixtures_to_listings(resp.fixtures, sport_id, limit))
}

impl PinnacleSource {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl MarketSource for PinnacleSource {
    fn source(&self) -> SourceId {
        SourceId::Pinnacle
    }

    fn supports_sport(&self, sport: &str) -> bool {
        pinnacle_sport_id(sport).is_some()
    }

    async fn fetch_upcoming_games(
        &self,
        sport: Option<&str>,
        limit: usize,
    ) -> Result<Vec<GameListing>> {
        let Some(sport_id) = sport.and_then(pinnacle_sport_id) else {
            tracing::debug!(sport = ?sport, "Pinnacle has no sport id for tag");
            return Ok(Vec::new());
        };

        let url = format!("{}/fixtures", self.base_url);
        let mut req = self.client.get(&url).query(&[("sportId", sport_id)]);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Basic {}", key));
        }

        let resp: PinnacleFixturesResponse = get_json(req, SourceId::Pinnacle).await?;
        Ok(fixtures_to_listings(resp.fixtures, sport_id, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "fixtures": [
            {"id": 1001, "away": {"name": "Boston Celtics"}, "home": {"name": "Los Angeles Lakers"},
             "moneyline": {"away": -150, "home": 130}, "status": "open"},
            {"id": 1002, "away": {"name": "Dallas Mavericks"}, "home": {"name": "Phoenix Suns"},
             "moneyline": {"away": 120, "home": -140}, "status": "closed"},
            {"id": "1003", "away": {"name": "Miami Heat"}, "home": {"name": "Chicago Bulls"}},
            {"away": {"name": "No"}, "home": {"name": "Id"}},
            {"id": 1005, "away": {"name": "Utah Jazz"}, "home": {"name": "Denver Nuggets"},
             "moneyline": {"away": 200}}
        ]
    }"#;

    #[test]
    fn test_sport_id_mapping() {
        assert_eq!(pinnacle_sport_id("NBA"), Some(1));
        assert_eq!(pinnacle_sport_id("MLB"), Some(4));
        assert_eq!(pinnacle_sport_id("EPL"), None);
        assert_eq!(sport_name(23), "NCAA Basketball");
        assert_eq!(sport_name(99), "Unknown");
    }

    #[test]
    fn test_parse_fixture() {
        let listings = parse_pinnacle_fixtures(FIXTURE, 1, 15).unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.game_id.as_str()).collect();
        assert_eq!(ids, vec!["pinnacle_1001", "pinnacle_1003", "pinnacle_1005"]);

        let first = &listings[0];
        assert_eq!(first.sport, "NBA");
        let teams = first.teams.as_ref().unwrap();
        assert_eq!(teams.away, "Boston Celtics");
        assert_eq!(teams.home, "Los Angeles Lakers");
        assert_eq!(first.outcomes.len(), 2);
        assert_eq!(first.outcomes[0].name, "Boston Celtics");
        assert!((first.outcomes[0].decimal_odds - 1.6667).abs() < 1e-4);
        assert!((first.outcomes[1].decimal_odds - 2.3).abs() < 1e-9);
    }

    #[test]
    fn test_missing_moneyline_defaults_away() {
        let listings = parse_pinnacle_fixtures(FIXTURE, 1, 15).unwrap();
        let heat = listings.iter().find(|l| l.game_id == "pinnacle_1003").unwrap();
        assert_eq!(heat.outcomes.len(), 1);
        assert!((heat.reference_decimal_odds().unwrap() - 1.90909).abs() < 1e-4);
    }

    #[test]
    fn test_zero_away_moneyline_keeps_away_reference() {
        let json = r#"{"fixtures": [
            {"id": 7, "away": {"name": "Boston Celtics"}, "home": {"name": "Los Angeles Lakers"},
             "moneyline": {"away": 0, "home": -200}}
        ]}"#;
        let listings = parse_pinnacle_fixtures(json, 1, 15).unwrap();
        let l = &listings[0];
        assert_eq!(l.outcomes.len(), 2);
        assert_eq!(l.outcomes[0].name, "Boston Celtics");
        assert!((l.reference_decimal_odds().unwrap() - 1.90909).abs() < 1e-4);
        assert_eq!(l.outcomes[1].name, "Los Angeles Lakers");
        assert!((l.outcomes[1].decimal_odds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_limit_applies_before_filtering() {
        let listings = parse_pinnacle_fixtures(FIXTURE, 1, 2).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].game_id, "pinnacle_1001");
    }

    #[test]
    fn test_supports_sport() {
        let src = PinnacleSource::new("https://api.pinnacle.com/v1", None, Duration::from_secs(1))
            .unwrap();
        assert!(src.supports_sport("NHL"));
        assert!(!src.supports_sport("Cricket"));
    }

    #[tokio::test]
    async fn test_unmapped_sport_fetches_nothing() {
        // No network: the sport has no id so the request is never sent.
        let src = PinnacleSource::new("http://127.0.0.1:9", None, Duration::from_millis(50))
            .unwrap();
        assert!(src.fetch_upcoming_games(Some("Cricket"), 15).await.unwrap().is_empty());
        assert!(src.fetch_upcoming_games(None, 15).await.unwrap().is_empty());
    }
}
