//! Kalshi prediction-market listings.
//!
//! Endpoint: GET {base}/markets?limit=N&status=open[&category=sports/nba]
//! Each market carries a single "yes" contract price in dollars (0–1).

use super::types::*;
use super::{build_client, get_json, parse_records, MarketSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Price used when Kalshi reports a non-positive yes price (a coin flip).
const EVEN_MONEY_DECIMAL: f64 = 2.0;

pub struct KalshiSource {
    client: Client,
    base_url: String,
}

/// Map our sport tag to the Kalshi market category.
fn kalshi_category(sport: &str) -> Option<&'static str> {
    match sport {
        "NBA" => Some("sports/nba"),
        "NFL" => Some("sports/nfl"),
        "NHL" => Some("sports/nhl"),
        "MLB" => Some("sports/mlb"),
        _ => None,
    }
}

// ── Kalshi JSON response types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KalshiMarketsResponse {
    #[serde(default)]
    markets: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct KalshiMarket {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    status: String,
    outcome_prices: Option<KalshiOutcomePrices>,
}

#[derive(Debug, Deserialize)]
struct KalshiOutcomePrices {
    yes: Option<f64>,
}

// ── Parsing ───────────────────────────────────────────────────────────

/// Decimal odds implied by a yes price. `None` for prices that cannot be a probability.
fn yes_price_to_decimal(yes: f64) -> Option<f64> {
    if yes <= 0.0 {
        Some(EVEN_MONEY_DECIMAL)
    } else if yes < 1.0 {
        Some(1.0 / yes)
    } else {
        None
    }
}

fn market_to_listing(market: KalshiMarket, sport: &str) -> Option<GameListing> {
    let id = market.id.map(|id| id.to_string()).unwrap_or_default();
    let yes = market.outcome_prices.and_then(|p| p.yes)?;
    let Some(decimal_odds) = yes_price_to_decimal(yes) else {
        tracing::warn!(market = %id, yes, "skipping Kalshi market: yes price out of range");
        return None;
    };

    Some(GameListing {
        source: SourceId::Kalshi,
        game_id: id,
        display_name: market.title,
        teams: None,
        sport: sport.to_string(),
        closed: market.status != "open",
        outcomes: vec![Outcome {
            name: "Yes".to_string(),
            decimal_odds,
        }],
    })
}

fn markets_to_listings(raw: Vec<serde_json::Value>, sport: Option<&str>) -> Vec<GameListing> {
    let sport = sport.unwrap_or("Unknown");
    parse_records::<KalshiMarket>(SourceId::Kalshi, raw)
        .into_iter()
        .filter_map(|m| market_to_listing(m, sport))
        .collect()
}

/// Parse a Kalshi `/markets` body into listings.
/// Public for unit testing with fixtures.
pub fn parse_kalshi_markets(json: &str, sport: Option<&str>) -> Result<Vec<GameListing>> {
    let resp: KalshiMarketsResponse =
        serde_json::from_str(json).context("failed to parse Kalshi JSON")?;
    Ok(markets_to_listings(resp.markets, sport))
}

impl KalshiSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketSource for KalshiSource {
    fn source(&self) -> SourceId {
        SourceId::Kalshi
    }

    async fn fetch_upcoming_games(
        &self,
        sport: Option<&str>,
        limit: usize,
    ) -> Result<Vec<GameListing>> {
        let url = format!("{}/markets", self.base_url);
        let mut query: Vec<(&str, String)> =
            vec![("limit", limit.to_string()), ("status", "open".to_string())];
        if let Some(category) = sport.and_then(kalshi_category) {
            query.push(("category", category.to_string()));
        }

        let resp: KalshiMarketsResponse =
            get_json(self.client.get(&url).query(&query), SourceId::Kalshi).await?;

        Ok(markets_to_listings(resp.markets, sport))
    }
}
