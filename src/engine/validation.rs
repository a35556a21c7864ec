//! Input checks run before anything reaches the odds math.

use thiserror::Error;

pub const MIN_AMERICAN_ODDS: f64 = -1000.0;
pub const MAX_AMERICAN_ODDS: f64 = 10000.0;
pub const MAX_BANKROLL: f64 = 1_000_000.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} cannot be zero")]
    ZeroOdds { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be greater than 1.0, got {value}")]
    DecimalOddsTooLow { field: &'static str, value: f64 },

    #[error("{field} must be strictly between 0 and 1, got {value}")]
    Probability { field: &'static str, value: f64 },
}

fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

pub fn validate_american_odds(field: &'static str, odds: f64) -> Result<(), ValidationError> {
    let odds = finite(field, odds)?;
    if !(MIN_AMERICAN_ODDS..=MAX_AMERICAN_ODDS).contains(&odds) {
        return Err(ValidationError::OutOfRange {
            field,
            value: odds,
            min: MIN_AMERICAN_ODDS,
            max: MAX_AMERICAN_ODDS,
        });
    }
    if odds == 0.0 {
        return Err(ValidationError::ZeroOdds { field });
    }
    Ok(())
}

pub fn validate_decimal_odds(field: &'static str, odds: f64) -> Result<(), ValidationError> {
    let odds = finite(field, odds)?;
    if odds <= 1.0 {
        return Err(ValidationError::DecimalOddsTooLow { field, value: odds });
    }
    Ok(())
}

pub fn validate_bankroll(field: &'static str, amount: f64) -> Result<(), ValidationError> {
    let amount = finite(field, amount)?;
    if !(0.0..=MAX_BANKROLL).contains(&amount) {
        return Err(ValidationError::OutOfRange {
            field,
            value: amount,
            min: 0.0,
            max: MAX_BANKROLL,
        });
    }
    Ok(())
}

pub fn validate_probability(field: &'static str, p: f64) -> Result<(), ValidationError> {
    let p = finite(field, p)?;
    if p <= 0.0 || p >= 1.0 {
        return Err(ValidationError::Probability { field, value: p });
    }
    Ok(())
}

/// Trim, cap at `max_len` characters and drop control characters.
pub fn sanitize_string(text: &str, max_len: usize) -> String {
    text.trim()
        .chars()
        .take(max_len)
        .filter(|c| !c.is_control())
        .collect()
}
