//! Two-outcome arbitrage between a prediction-market price and a sharp price.

use serde::Serialize;

/// Stake split for one binary event quoted at two venues.
/// All amounts are unrounded; display rounding happens in `analysis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArbitrageResult {
    pub has_arbitrage: bool,
    pub arbitrage_percent: f64,
    pub pm_bet: f64,
    pub sharp_bet: f64,
    pub guaranteed_profit: f64,
    pub roi_percent: f64,
}

impl ArbitrageResult {
    pub fn none() -> Self {
        Self {
            has_arbitrage: false,
            arbitrage_percent: 0.0,
            pm_bet: 0.0,
            sharp_bet: 0.0,
            guaranteed_profit: 0.0,
            roi_percent: 0.0,
        }
    }

    /// Payout if either side wins. Equal on both sides when an arb exists.
    pub fn guaranteed_return(&self) -> f64 {
        self.pm_bet + self.sharp_bet + self.guaranteed_profit
    }
}

/// Solve the two-way arbitrage.
///
/// Both odds are decimal and must be > 1.0. The stake is split in proportion to
/// each side's implied probability, so either outcome returns `stake / total`.
/// No arbitrage (or a non-positive stake) yields all zeros; there is no partial hedge.
pub fn solve(pm_decimal: f64, sharp_decimal: f64, stake: f64) -> ArbitrageResult {
    if stake <= 0.0 {
        return ArbitrageResult::none();
    }

    let pm_prob = 1.0 / pm_decimal;
    let sharp_prob = 1.0 / sharp_decimal;
    let total = pm_prob + sharp_prob;

    if total >= 1.0 {
        return ArbitrageResult::none();
    }

    let profit = stake / total - stake;

    ArbitrageResult {
        has_arbitrage: true,
        arbitrage_percent: ((1.0 / total - 1.0) * 100.0).max(0.0),
        pm_bet: stake * pm_prob / total,
        sharp_bet: stake * sharp_prob / total,
        guaranteed_profit: profit,
        roi_percent: profit / stake * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_arb_splits_evenly() {
        // 1/2.10 * 2 = 0.9524 → return 105 on 100 staked
        let arb = solve(2.10, 2.10, 100.0);
        assert!(arb.has_arbitrage);
        assert!((arb.pm_bet - 50.0).abs() < 0.1);
        assert!((arb.sharp_bet - 50.0).abs() < 0.1);
        assert!((arb.guaranteed_profit - 5.0).abs() < 0.1);
        assert!((arb.roi_percent - 5.0).abs() < 0.1);
        assert!((arb.arbitrage_percent - 5.0).abs() < 0.1);
    }

    #[test]
    fn test_vigged_market_has_no_arb() {
        // 1/1.90 * 2 = 1.0526
        let arb = solve(1.90, 1.90, 100.0);
        assert_eq!(arb, ArbitrageResult::none());

        // 1/1.80 * 2 = 1.111
        let arb = solve(1.80, 1.80, 100.0);
        assert!(!arb.has_arbitrage);
        assert_eq!(arb.pm_bet, 0.0);
        assert_eq!(arb.sharp_bet, 0.0);
        assert_eq!(arb.guaranteed_profit, 0.0);
        assert_eq!(arb.arbitrage_percent, 0.0);
    }

    #[test]
    fn test_exactly_fair_book_is_not_arb() {
        let arb = solve(2.0, 2.0, 100.0);
        assert!(!arb.has_arbitrage);
    }

    #[test]
    fn test_asymmetric_arb_pays_equal_on_both_sides() {
        // PM 3.0 (p=0.333), sharp 1.7 (p=0.588) → total 0.922
        let arb = solve(3.0, 1.7, 1000.0);
        assert!(arb.has_arbitrage);
        let pm_payout = arb.pm_bet * 3.0;
        let sharp_payout = arb.sharp_bet * 1.7;
        assert!((pm_payout - sharp_payout).abs() < 1e-6);
        assert!((pm_payout - arb.guaranteed_return()).abs() < 1e-6);
        assert!((arb.pm_bet + arb.sharp_bet - 1000.0).abs() < 1e-6);
        assert!(arb.sharp_bet > arb.pm_bet); // favorite takes the bigger slice
    }

    #[test]
    fn test_non_positive_stake_is_all_zero() {
        assert_eq!(solve(2.10, 2.10, 0.0), ArbitrageResult::none());
        assert_eq!(solve(2.10, 2.10, -50.0), ArbitrageResult::none());
    }
}
