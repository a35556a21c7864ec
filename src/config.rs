use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Accepted `Host` header values. `*.domain` matches any subdomain, `*` matches anything.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string(), "http://localhost:3000".to_string()]
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string(), "*.example.com".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedsConfig {
    #[serde(default = "default_kalshi_url")]
    pub kalshi_base_url: String,
    #[serde(default = "default_novig_url")]
    pub novig_base_url: String,
    #[serde(default = "default_pinnacle_url")]
    pub pinnacle_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_kalshi_url() -> String { "https://api.kalshi.com/v1".to_string() }
fn default_novig_url() -> String { "https://api.novig.com/v1".to_string() }
fn default_pinnacle_url() -> String { "https://api.pinnacle.com/v1".to_string() }
fn default_request_timeout() -> u64 { 10_000 }

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            kalshi_base_url: default_kalshi_url(),
            novig_base_url: default_novig_url(),
            pinnacle_base_url: default_pinnacle_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl FeedsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// How prediction-market sources are queried. The winner is the same either way.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    #[default]
    Sequential,
    Concurrent,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregatorConfig {
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_ms: u64,
    #[serde(default)]
    pub fetch_mode: FetchMode,
}

fn default_listing_limit() -> usize { 15 }
fn default_fetch_timeout() -> u64 { 10_000 }

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            listing_limit: default_listing_limit(),
            fetch_timeout_ms: default_fetch_timeout(),
            fetch_mode: FetchMode::default(),
        }
    }
}

impl AggregatorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_bankroll")]
    pub default_bankroll: f64,
}

fn default_bankroll() -> f64 { 1000.0 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { default_bankroll: default_bankroll() }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load `path` if it exists, otherwise run on defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// `CORS_ORIGINS` (comma separated) replaces the configured origin list.
    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("CORS_ORIGINS") {
            let origins = parse_origins(&raw);
            if !origins.is_empty() {
                self.server.cors_origins = origins;
            }
        }
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env_lines(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Pinnacle credentials are optional; unauthenticated requests are still attempted.
    pub fn pinnacle_api_key() -> Option<String> {
        std::env::var("PINNACLE_API_KEY")
            .ok()
            .map(|k| sanitize_key(&k))
            .filter(|k| !k.is_empty())
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// KEY=VALUE pairs from .env content, skipping blanks and comments.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
