//! HTTP surface: health, single-game analysis and the upcoming-odds feed.

use crate::aggregator::{AggregatedGame, OddsAggregator, SyncSummary};
use crate::analysis::{analyze, AnalysisRequest, GameAnalysis};
use crate::config::{Config, ServerConfig};
use crate::engine::validation::{sanitize_string, ValidationError};
use crate::error::ApiError;
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const MAX_SPORT_LEN: usize = 32;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<OddsAggregator>,
    pub default_bankroll: f64,
}

/// Body of `POST /calculate`. Odds are American.
#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRequest {
    pub sharp_odds: f64,
    #[serde(default)]
    pub pm_odds: Option<f64>,
    #[serde(default)]
    pub bankroll: Option<f64>,
    #[serde(default)]
    pub true_probability: Option<f64>,
}

impl CalculateRequest {
    /// Fill the bankroll default and check every field.
    pub fn validate(&self, default_bankroll: f64) -> Result<AnalysisRequest, ValidationError> {
        let req = AnalysisRequest {
            sharp_odds: self.sharp_odds,
            pm_odds: self.pm_odds,
            bankroll: self.bankroll.unwrap_or(default_bankroll),
            true_probability: self.true_probability,
        };
        req.validate()?;
        Ok(req)
    }
}

#[derive(Debug, Deserialize)]
struct SportQuery {
    sport: Option<String>,
}

impl SportQuery {
    fn filter(&self) -> Option<String> {
        self.sport
            .as_deref()
            .map(|s| sanitize_string(s, MAX_SPORT_LEN))
            .filter(|s| !s.is_empty())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct UpcomingResponse {
    status: &'static str,
    sport: String,
    count: usize,
    games: Vec<AggregatedGame>,
}

#[derive(Serialize)]
struct SyncResponse {
    status: &'static str,
    message: String,
}

/// `Host` header allowlist. Entries are exact names, `*.domain` or `*`.
#[derive(Debug, Clone)]
pub struct TrustedHosts {
    patterns: Vec<String>,
}

impl TrustedHosts {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| p.trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn allows(&self, host: &str) -> bool {
        let host = strip_port(host).to_ascii_lowercase();
        self.patterns.iter().any(|pattern| {
            if pattern == "*" {
                return true;
            }
            match pattern.strip_prefix('*') {
                Some(suffix) => host.ends_with(suffix),
                None => *pattern == host,
            }
        })
    }
}

fn strip_port(host: &str) -> &str {
    if let Some((v6, _)) = host.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
        return v6;
    }
    host.split_once(':').map_or(host, |(name, _)| name)
}

async fn check_host(
    State(hosts): State<Arc<TrustedHosts>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or("");
    if !hosts.allows(host) {
        tracing::warn!(host, "rejecting request with untrusted Host header");
        return Err(ApiError::BadRequest("Invalid host header".to_string()));
    }
    Ok(next.run(req).await)
}

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let trusted = Arc::new(TrustedHosts::new(&server.allowed_hosts));

    Router::new()
        .route("/health", get(health_check))
        .route("/calculate", post(calculate))
        .route("/odds/upcoming", get(upcoming_odds))
        .route("/odds/sync", post(sync_odds))
        .with_state(state)
        .layer(middleware::from_fn_with_state(trusted, check_host))
        .layer(cors_layer(&server.cors_origins))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(
                "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline';",
            ),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Only the listed origins; unparseable entries are logged and ignored.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn calculate(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<GameAnalysis>, ApiError> {
    let Json(body) = payload?;
    let req = body.validate(state.default_bankroll)?;
    Ok(Json(analyze(&req)))
}

async fn upcoming_odds(
    State(state): State<AppState>,
    Query(query): Query<SportQuery>,
) -> Result<Json<UpcomingResponse>, ApiError> {
    let sport = query.filter();
    let aggregator = Arc::clone(&state.aggregator);
    let filter = sport.clone();
    let games =
        in_task(async move { aggregator.get_upcoming_games(filter.as_deref()).await }).await?;

    Ok(Json(UpcomingResponse {
        status: "success",
        sport: sport.unwrap_or_else(|| "all".to_string()),
        count: games.len(),
        games,
    }))
}

async fn sync_odds(
    State(state): State<AppState>,
    Query(query): Query<SportQuery>,
) -> Result<Json<SyncResponse>, ApiError> {
    let sport = query.filter();
    let aggregator = Arc::clone(&state.aggregator);
    let summary: SyncSummary =
        in_task(async move { aggregator.sync(sport.as_deref()).await }).await?;

    tracing::info!(sport = %summary.sport, count = summary.count, "sync complete");
    Ok(Json(SyncResponse {
        status: "success",
        message: format!("Synced {} games", summary.count),
    }))
}

/// Run aggregation on its own task so a panicking adapter becomes a 500.
async fn in_task<T, F>(fut: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| ApiError::Internal(format!("aggregation task failed: {}", e)))
}

pub async fn serve(config: Config) -> Result<()> {
    let aggregator = Arc::new(OddsAggregator::from_config(&config)?);
    let state = AppState {
        aggregator,
        default_bankroll: config.analysis.default_bankroll,
    };
    let app = create_router(state, &config.server);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(
        addr = %addr,
        origins = ?config.server.cors_origins,
        hosts = ?config.server.allowed_hosts,
        "HTTP server listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
