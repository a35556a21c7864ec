//! Odds conversions and expected value.
//!
//! American odds must be nonzero; callers run `validation::validate_american_odds`
//! before anything here.

use serde::{Deserialize, Serialize};

/// Convert American odds to decimal odds.
/// Positive odds (e.g., +150): decimal = odds / 100 + 1
/// Negative odds (e.g., -150): decimal = 100 / |odds| + 1
pub fn american_to_decimal(odds: f64) -> f64 {
    if odds > 0.0 {
        odds / 100.0 + 1.0
    } else {
        100.0 / odds.abs() + 1.0
    }
}

/// Convert decimal odds back to American odds.
/// Decimal >= 2.0 maps to the positive (underdog) region, below 2.0 to the negative.
pub fn decimal_to_american(decimal: f64) -> f64 {
    if decimal >= 2.0 {
        (decimal - 1.0) * 100.0
    } else {
        -100.0 / (decimal - 1.0)
    }
}

/// Implied probability of American odds, with the margin left in.
pub fn implied_probability(odds: f64) -> f64 {
    1.0 / american_to_decimal(odds)
}

pub fn decimal_implied_probability(decimal: f64) -> f64 {
    1.0 / decimal
}

/// EV per unit staked at `odds` when the event really happens with `true_probability`.
/// Positive means the price pays more than the probability requires.
pub fn expected_value(odds: f64, true_probability: f64) -> f64 {
    true_probability * american_to_decimal(odds) - 1.0
}

/// A single-line price in either representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "value", rename_all = "lowercase")]
pub enum OddsQuote {
    American(f64),
    Decimal(f64),
}

impl OddsQuote {
    pub fn decimal(&self) -> f64 {
        match *self {
            OddsQuote::American(a) => american_to_decimal(a),
            OddsQuote::Decimal(d) => d,
        }
    }

    pub fn american(&self) -> f64 {
        match *self {
            OddsQuote::American(a) => a,
            OddsQuote::Decimal(d) => decimal_to_american(d),
        }
    }

    pub fn implied_probability(&self) -> f64 {
        decimal_implied_probability(self.decimal())
    }
}
