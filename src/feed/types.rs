use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized internal types shared by every provider adapter.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Pinnacle,
    Kalshi,
    Novig,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Pinnacle => "pinnacle",
            SourceId::Kalshi => "kalshi",
            SourceId::Novig => "novig",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-side record id. Feeds send it as a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Num(u64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Num(n) => write!(f, "{}", n),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

/// One side of a market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub name: String,
    pub decimal_odds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matchup {
    pub away: String,
    pub home: String,
}

/// One event as listed by one source. Built per fetch and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameListing {
    pub source: SourceId,
    pub game_id: String,
    pub display_name: String,
    pub teams: Option<Matchup>,
    pub sport: String,
    pub closed: bool,
    pub outcomes: Vec<Outcome>,
}

impl GameListing {
    /// Most favorable decimal price across outcomes.
    pub fn best_decimal_odds(&self) -> Option<f64> {
        self.outcomes
            .iter()
            .map(|o| o.decimal_odds)
            .fold(None, |best, d| match best {
                Some(b) if b >= d => Some(b),
                _ => Some(d),
            })
    }

    /// The price a sharp listing contributes to a merged record: its first outcome.
    pub fn reference_decimal_odds(&self) -> Option<f64> {
        self.outcomes.first().map(|o| o.decimal_odds)
    }
}
