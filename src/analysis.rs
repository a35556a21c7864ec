//! Single-game analysis: EV, Kelly sizing and arbitrage for one pair of prices.

use crate::engine::arbitrage;
use crate::engine::kelly::{kelly_fraction, kelly_stake};
use crate::engine::odds::{american_to_decimal, expected_value, implied_probability};
use crate::engine::validation::{
    validate_american_odds, validate_bankroll, validate_probability, ValidationError,
};
use serde::Serialize;

/// Prices are American odds. `pm_odds` absent means only the sharp line is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisRequest {
    pub sharp_odds: f64,
    pub pm_odds: Option<f64>,
    pub bankroll: f64,
    pub true_probability: Option<f64>,
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_american_odds("sharp_odds", self.sharp_odds)?;
        if let Some(pm) = self.pm_odds {
            validate_american_odds("pm_odds", pm)?;
        }
        validate_bankroll("bankroll", self.bankroll)?;
        if let Some(p) = self.true_probability {
            validate_probability("true_probability", p)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvAnalysis {
    pub ev_percent: f64,
    pub has_edge: bool,
    pub sharp_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KellyAnalysis {
    pub kelly_fraction: f64,
    pub full_kelly_bet: f64,
    pub half_kelly_bet: f64,
    pub quarter_kelly_bet: f64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageAnalysis {
    pub has_arbitrage: bool,
    pub arbitrage_percent: f64,
    pub pm_bet: f64,
    pub sharp_bet: f64,
    pub guaranteed_profit: f64,
    pub roi_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAnalysis {
    pub ev_analysis: EvAnalysis,
    pub kelly_analysis: KellyAnalysis,
    pub arbitrage_analysis: Option<ArbitrageAnalysis>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Percentages, probabilities and fractions.
fn ratio(value: f64) -> f64 {
    round_to(value, 4)
}

fn currency(value: f64) -> f64 {
    round_to(value, 2)
}

impl From<arbitrage::ArbitrageResult> for ArbitrageAnalysis {
    fn from(arb: arbitrage::ArbitrageResult) -> Self {
        Self {
            has_arbitrage: arb.has_arbitrage,
            arbitrage_percent: ratio(arb.arbitrage_percent),
            pm_bet: currency(arb.pm_bet),
            sharp_bet: currency(arb.sharp_bet),
            guaranteed_profit: currency(arb.guaranteed_profit),
            roi_percent: ratio(arb.roi_percent),
        }
    }
}

/// Analyze one game. Inputs must already have passed [`AnalysisRequest::validate`].
///
/// The true probability defaults to the sharp line's implied probability. Kelly
/// sizes against the better of the two prices; rounding applies to output only.
pub fn analyze(req: &AnalysisRequest) -> GameAnalysis {
    let sharp_probability = implied_probability(req.sharp_odds);
    let true_p = req.true_probability.unwrap_or(sharp_probability);

    let sharp_decimal = american_to_decimal(req.sharp_odds);
    let pm_decimal = req.pm_odds.map(american_to_decimal);

    let ev = req.pm_odds.map_or(0.0, |pm| expected_value(pm, true_p));

    let best_decimal = pm_decimal.map_or(sharp_decimal, |pm| pm.max(sharp_decimal));
    let fraction = kelly_fraction(true_p, 1.0 - true_p, best_decimal);
    let full = kelly_stake(fraction, req.bankroll);

    let arbitrage_analysis =
        pm_decimal.map(|pm| arbitrage::solve(pm, sharp_decimal, req.bankroll).into());

    tracing::debug!(
        sharp_odds = req.sharp_odds,
        pm_odds = ?req.pm_odds,
        ev,
        kelly = fraction,
        "analyzed game"
    );

    GameAnalysis {
        ev_analysis: EvAnalysis {
            ev_percent: ratio(ev * 100.0),
            has_edge: ev > 0.0,
            sharp_probability: ratio(sharp_probability),
        },
        kelly_analysis: KellyAnalysis {
            kelly_fraction: ratio(fraction),
            full_kelly_bet: currency(full),
            half_kelly_bet: currency(full * 0.5),
            quarter_kelly_bet: currency(full * 0.25),
            is_valid: fraction > 0.0,
        },
        arbitrage_analysis,
    }
}
