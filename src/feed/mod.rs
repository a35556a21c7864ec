pub mod kalshi;
pub mod novig;
pub mod pinnacle;
pub mod types;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use types::{GameListing, SourceId};

pub const USER_AGENT: &str = "SharpsEdgeDetector/1.0";

/// A provider of upcoming-game listings, normalized to `GameListing`.
#[async_trait]
pub trait MarketSource: Send + Sync {
    fn source(&self) -> SourceId;

    /// Whether this provider can be queried for `sport` at all.
    fn supports_sport(&self, _sport: &str) -> bool {
        true
    }

    async fn fetch_upcoming_games(
        &self,
        sport: Option<&str>,
        limit: usize,
    ) -> Result<Vec<GameListing>>;
}

/// Shared reqwest client for provider adapters.
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build reqwest client")
}

/// Deserialize each raw record on its own so one bad record never sinks the batch.
pub(crate) fn parse_records<T: DeserializeOwned>(
    source: SourceId,
    raw: Vec<serde_json::Value>,
) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(source = %source, index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Send `req` and deserialize the JSON body, failing on any non-2xx status.
pub(crate) async fn get_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
    source: SourceId,
) -> Result<T> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("{} request failed", source))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{} API error ({}): {}", source, status, body);
    }

    resp.json()
        .await
        .with_context(|| format!("failed to parse {} response", source))
}
