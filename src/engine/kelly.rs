//! Kelly criterion stake sizing.

/// Hard ceiling on the fraction of bankroll any single bet may take.
pub const MAX_KELLY_FRACTION: f64 = 0.25;

/// Compute the Kelly fraction of bankroll to stake.
///
/// - `win_probability`: probability the bet wins
/// - `loss_probability`: probability the bet loses (need not be `1 - win` when a push is possible)
/// - `decimal_odds`: total return per unit staked, must be > 1.0
///
/// Negative edge returns 0 (no bet); anything above `MAX_KELLY_FRACTION` is capped.
pub fn kelly_fraction(win_probability: f64, loss_probability: f64, decimal_odds: f64) -> f64 {
    let b = decimal_odds - 1.0;

    // f* = (b*p - q) / b
    let f_star = (win_probability * b - loss_probability) / b;

    f_star.clamp(0.0, MAX_KELLY_FRACTION)
}

/// Amount to stake for a given fraction; bankroll is already validated non-negative.
pub fn kelly_stake(kelly_fraction: f64, bankroll: f64) -> f64 {
    kelly_fraction * bankroll
}
