// End-to-end aggregation over provider fixtures, without network.

use anyhow::Result;
use async_trait::async_trait;
use sharps_edge::aggregator::OddsAggregator;
use sharps_edge::analysis::{analyze, AnalysisRequest};
use sharps_edge::config::FetchMode;
use sharps_edge::engine::odds::decimal_to_american;
use sharps_edge::feed::kalshi::parse_kalshi_markets;
use sharps_edge::feed::novig::parse_novig_events;
use sharps_edge::feed::pinnacle::{parse_pinnacle_fixtures, pinnacle_sport_id};
use sharps_edge::feed::types::{GameListing, SourceId};
use sharps_edge::feed::MarketSource;
use std::sync::Arc;

const KALSHI_MARKETS: &str = r#"{
    "markets": [
        {"id": "KX-LAL-BOS", "title": "Lakers vs Celtics", "status": "open",
         "outcome_prices": {"yes": 0.45}},
        {"id": "KX-DAL-PHX", "title": "Mavericks vs Suns", "status": "closed",
         "outcome_prices": {"yes": 0.55}},
        {"id": "KX-MIA-CHI", "title": "Heat vs Bulls", "status": "open",
         "outcome_prices": {"yes": 0.0}},
        {"id": "KX-BAD", "title": 42}
    ]
}"#;

const NOVIG_EVENTS: &str = r#"{
    "events": [
        {"id": "nv-1", "title": "Knicks vs Nets", "status": "open",
         "options": [{"name": "Knicks", "odds": {"decimal": 1.95}}]}
    ]
}"#;

const PINNACLE_FIXTURES: &str = r#"{
    "fixtures": [
        {"id": 1, "away": {"name": "Dallas Mavericks"}, "home": {"name": "Phoenix Suns"},
         "moneyline": {"away": 120, "home": -140}},
        {"id": 2, "away": {"name": "Boston Celtics"}, "home": {"name": "Los Angeles Lakers"},
         "moneyline": {"away": -110, "home": -110}},
        {"id": 3, "away": {"name": "Miami Heat"}, "home": {"name": "Chicago Bulls"},
         "moneyline": {"away": 150, "home": -170}}
    ]
}"#;

struct FixtureSource {
    id: SourceId,
    listings: Vec<GameListing>,
    sharp_sports: bool,
}

#[async_trait]
impl MarketSource for FixtureSource {
    fn source(&self) -> SourceId {
        self.id
    }

    fn supports_sport(&self, sport: &str) -> bool {
        !self.sharp_sports || pinnacle_sport_id(sport).is_some()
    }

    async fn fetch_upcoming_games(&self, _sport: Option<&str>, limit: usize) -> Result<Vec<GameListing>> {
        Ok(self.listings.iter().take(limit).cloned().collect())
    }
}

fn source(id: SourceId, listings: Vec<GameListing>) -> Arc<dyn MarketSource> {
    Arc::new(FixtureSource { id, listings, sharp_sports: id == SourceId::Pinnacle })
}

fn aggregator(kalshi: Vec<GameListing>, mode: FetchMode) -> OddsAggregator {
    let novig = parse_novig_events(NOVIG_EVENTS, Some("NBA")).unwrap();
    let pinnacle = parse_pinnacle_fixtures(PINNACLE_FIXTURES, 1, 15).unwrap();
    OddsAggregator::new(
        vec![source(SourceId::Kalshi, kalshi), source(SourceId::Novig, novig)],
        Some(source(SourceId::Pinnacle, pinnacle)),
    )
    .with_fetch_mode(mode)
}

#[tokio::test]
async fn test_kalshi_listings_enriched_with_pinnacle() {
    let kalshi = parse_kalshi_markets(KALSHI_MARKETS, Some("NBA")).unwrap();
    let games = aggregator(kalshi, FetchMode::Sequential)
        .get_upcoming_games(Some("NBA"))
        .await;

    let ids: Vec<&str> = games.iter().map(|g| g.game_id.as_str()).collect();
    assert_eq!(ids, vec!["KX-LAL-BOS", "KX-MIA-CHI"]);
    assert!(games.iter().all(|g| !g.closed && g.source == SourceId::Kalshi));

    let lakers = &games[0];
    assert!((lakers.pm_odds.unwrap() - 1.0 / 0.45).abs() < 1e-9);
    // Away moneyline of the Celtics @ Lakers fixture
    assert!((lakers.sharp_odds.unwrap() - 1.90909).abs() < 1e-4);
    assert!((lakers.sharp_probability.unwrap() - 0.5238).abs() < 1e-4);

    // Zero yes price is priced as a coin flip
    let heat = &games[1];
    assert_eq!(heat.pm_odds, Some(2.0));
    assert!((heat.sharp_odds.unwrap() - 2.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_falls_back_to_novig_in_both_modes() {
    for mode in [FetchMode::Sequential, FetchMode::Concurrent] {
        let games = aggregator(Vec::new(), mode).get_upcoming_games(Some("NBA")).await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].source, SourceId::Novig);
        assert_eq!(games[0].game_id, "nv-1");
        // "Knicks vs Nets" has no sharp counterpart
        assert_eq!(games[0].sharp_odds, None);
    }
}

#[tokio::test]
async fn test_kalshi_wins_in_concurrent_mode() {
    let kalshi = parse_kalshi_markets(KALSHI_MARKETS, Some("NBA")).unwrap();
    let games = aggregator(kalshi, FetchMode::Concurrent)
        .get_upcoming_games(Some("NBA"))
        .await;
    assert!(games.iter().all(|g| g.source == SourceId::Kalshi));
}

#[tokio::test]
async fn test_unmapped_sport_leaves_games_unenriched() {
    let kalshi = parse_kalshi_markets(KALSHI_MARKETS, Some("EPL")).unwrap();
    let games = aggregator(kalshi, FetchMode::Sequential)
        .get_upcoming_games(Some("EPL"))
        .await;
    assert_eq!(games.len(), 2);
    assert!(games.iter().all(|g| g.sharp_odds.is_none() && g.sport == "EPL"));
}

#[tokio::test]
async fn test_aggregated_games_feed_analysis() {
    let kalshi = parse_kalshi_markets(KALSHI_MARKETS, Some("NBA")).unwrap();
    let games = aggregator(kalshi, FetchMode::Sequential)
        .get_upcoming_games(Some("NBA"))
        .await;

    let lakers = &games[0];
    let analysis = analyze(&AnalysisRequest {
        sharp_odds: decimal_to_american(lakers.sharp_odds.unwrap()),
        pm_odds: lakers.pm_odds.map(decimal_to_american),
        bankroll: 1000.0,
        true_probability: None,
    });

    // PM pays 2.22 against a 52.4% line; 0.45 + 0.524 < 1 so both sides lock in profit
    assert!(analysis.ev_analysis.has_edge);
    assert!(analysis.kelly_analysis.is_valid);
    let arb = analysis.arbitrage_analysis.unwrap();
    assert!(arb.has_arbitrage);
    assert!(arb.guaranteed_profit > 0.0);
}

#[tokio::test]
async fn test_sync_summary() {
    let kalshi = parse_kalshi_markets(KALSHI_MARKETS, Some("NBA")).unwrap();
    let summary = aggregator(kalshi, FetchMode::Sequential).sync(Some("NBA")).await;
    assert_eq!(summary.sport, "NBA");
    assert_eq!(summary.count, 2);
}
