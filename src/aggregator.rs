//! Merging prediction-market listings with sharp-book prices.
//!
//! One call to [`OddsAggregator::get_upcoming_games`] is one aggregation cycle:
//! prediction-market sources are tried in priority order and the first non-empty
//! answer is used; the sharp book is then consulted (only for a known sport) and
//! each prediction-market listing is linked to a sharp listing through the
//! configured [`TeamMatcher`]. Nothing is remembered between cycles.

use crate::config::{Config, FetchMode};
use crate::engine::matcher::{TeamMatcher, TokenOverlapMatcher};
use crate::engine::odds::decimal_implied_probability;
use crate::feed::kalshi::KalshiSource;
use crate::feed::novig::NovigSource;
use crate::feed::pinnacle::PinnacleSource;
use crate::feed::types::{GameListing, Outcome, SourceId};
use crate::feed::MarketSource;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// One event as seen across sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedGame {
    pub game_id: String,
    pub market_name: String,
    pub sport: String,
    pub source: SourceId,
    /// Best decimal price across the prediction-market listing's outcomes.
    pub pm_odds: Option<f64>,
    /// Decimal price of the matched sharp listing, if one matched.
    pub sharp_odds: Option<f64>,
    pub sharp_probability: Option<f64>,
    pub outcomes: Vec<Outcome>,
    pub closed: bool,
    pub aggregated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    pub sport: String,
    pub count: usize,
}

pub struct OddsAggregator {
    prediction_sources: Vec<Arc<dyn MarketSource>>,
    sharp_source: Option<Arc<dyn MarketSource>>,
    matcher: Box<dyn TeamMatcher>,
    listing_limit: usize,
    fetch_timeout: Duration,
    fetch_mode: FetchMode,
}

impl OddsAggregator {
    /// `prediction_sources` are in priority order: earlier sources win.
    pub fn new(
        prediction_sources: Vec<Arc<dyn MarketSource>>,
        sharp_source: Option<Arc<dyn MarketSource>>,
    ) -> Self {
        Self {
            prediction_sources,
            sharp_source,
            matcher: Box::new(TokenOverlapMatcher),
            listing_limit: 15,
            fetch_timeout: Duration::from_secs(10),
            fetch_mode: FetchMode::Sequential,
        }
    }

    /// Kalshi, then Novig, enriched with Pinnacle.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.feeds.request_timeout();
        let kalshi: Arc<dyn MarketSource> =
            Arc::new(KalshiSource::new(&config.feeds.kalshi_base_url, timeout)?);
        let novig: Arc<dyn MarketSource> =
            Arc::new(NovigSource::new(&config.feeds.novig_base_url, timeout)?);
        let pinnacle: Arc<dyn MarketSource> = Arc::new(PinnacleSource::new(
            &config.feeds.pinnacle_base_url,
            Config::pinnacle_api_key(),
            timeout,
        )?);

        Ok(Self::new(vec![kalshi, novig], Some(pinnacle))
            .with_listing_limit(config.aggregator.listing_limit)
            .with_fetch_timeout(config.aggregator.fetch_timeout())
            .with_fetch_mode(config.aggregator.fetch_mode))
    }

    pub fn with_matcher(mut self, matcher: Box<dyn TeamMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_listing_limit(mut self, limit: usize) -> Self {
        self.listing_limit = limit;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    /// Upcoming open games for `sport` (or every sport when `None`).
    /// Provider failures only shrink the result; they never fail the call.
    pub async fn get_upcoming_games(&self, sport: Option<&str>) -> Vec<AggregatedGame> {
        tracing::info!(sport = ?sport, "aggregating upcoming games");

        let Some((pm_source, pm_listings)) = self.acquire_prediction_listings(sport).await else {
            tracing::info!(sport = ?sport, "no prediction-market listings available");
            return Vec::new();
        };

        let sharp_listings = self.acquire_sharp_listings(sport).await;
        let now = Utc::now();

        let total = pm_listings.len();
        let games: Vec<AggregatedGame> = pm_listings
            .into_iter()
            .filter(|listing| !listing.closed)
            .map(|listing| self.assemble(listing, &sharp_listings, now))
            .collect();

        tracing::info!(
            source = %pm_source,
            listings = total,
            games = games.len(),
            matched = games.iter().filter(|g| g.sharp_odds.is_some()).count(),
            "aggregation complete"
        );
        games
    }

    /// Run an aggregation cycle and report only how many games it produced.
    pub async fn sync(&self, sport: Option<&str>) -> SyncSummary {
        let count = self.get_upcoming_games(sport).await.len();
        SyncSummary {
            sport: sport.unwrap_or("all").to_string(),
            count,
        }
    }

    fn assemble(
        &self,
        listing: GameListing,
        sharp_listings: &[GameListing],
        now: DateTime<Utc>,
    ) -> AggregatedGame {
        let pm_odds = listing.best_decimal_odds();
        let sharp_odds = self
            .matcher
            .find_match(&listing.display_name, sharp_listings)
            .and_then(GameListing::reference_decimal_odds);

        AggregatedGame {
            game_id: listing.game_id,
            market_name: listing.display_name,
            sport: listing.sport,
            source: listing.source,
            pm_odds,
            sharp_odds,
            sharp_probability: sharp_odds.map(decimal_implied_probability),
            outcomes: listing.outcomes,
            closed: listing.closed,
            aggregated_at: now,
        }
    }

    /// First non-empty answer in priority order, with the source that gave it.
    async fn acquire_prediction_listings(
        &self,
        sport: Option<&str>,
    ) -> Option<(SourceId, Vec<GameListing>)> {
        match self.fetch_mode {
            FetchMode::Sequential => {
                for source in &self.prediction_sources {
                    tracing::info!(source = %source.source(), "trying prediction source");
                    let listings = self.fetch_from(source.as_ref(), sport).await;
                    if !listings.is_empty() {
                        return Some((source.source(), listings));
                    }
                }
                None
            }
            FetchMode::Concurrent => {
                let results = futures_util::future::join_all(
                    self.prediction_sources
                        .iter()
                        .map(|source| self.fetch_from(source.as_ref(), sport)),
                )
                .await;

                // join_all keeps input order, so priority (not arrival) decides.
                self.prediction_sources
                    .iter()
                    .zip(results)
                    .find(|(_, listings)| !listings.is_empty())
                    .map(|(source, listings)| (source.source(), listings))
            }
        }
    }

    async fn acquire_sharp_listings(&self, sport: Option<&str>) -> Vec<GameListing> {
        let (Some(sport), Some(sharp)) = (sport, self.sharp_source.as_ref()) else {
            return Vec::new();
        };
        if !sharp.supports_sport(sport) {
            tracing::info!(source = %sharp.source(), sport, "no sharp mapping for sport, skipping enrichment");
            return Vec::new();
        }
        self.fetch_from(sharp.as_ref(), Some(sport)).await
    }

    /// Fetch under the per-provider timeout. Errors and timeouts come back empty.
    async fn fetch_from(&self, source: &dyn MarketSource, sport: Option<&str>) -> Vec<GameListing> {
        let id = source.source();
        let fetch = source.fetch_upcoming_games(sport, self.listing_limit);
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(listings)) => {
                tracing::debug!(source = %id, count = listings.len(), "fetched listings");
                listings
            }
            Ok(Err(e)) => {
                tracing::warn!(source = %id, error = %format!("{:#}", e), "fetch failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    source = %id,
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "fetch timed out"
                );
                Vec::new()
            }
        }
    }
}
