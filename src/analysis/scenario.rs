//! What-if scenarios.
//!
//! Re-runs the evaluator over perturbed inputs: the resale price scaled
//! by a fraction and the holding window shifted by whole months (floored
//! at one). The standard outlook pairs a pessimistic slip (price down
//! 10%, four months longer) with an optimistic lift (price up 5%, two
//! months shorter) around the base case.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::evaluator::evaluate;
use crate::types::{AuctionFacts, InvestmentResult, RateSettings};

/// A perturbation of the resale assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioShift {
    /// Fractional change to market value (-0.10 = 10% below expectation).
    pub price_shift: Decimal,
    /// Whole months added to (or removed from) the resale window.
    pub months_shift: i32,
}

/// Slower sale into a softer market.
pub const PESSIMISTIC: ScenarioShift = ScenarioShift {
    price_shift: dec!(-0.10),
    months_shift: 4,
};

/// Faster sale into a firmer market.
pub const OPTIMISTIC: ScenarioShift = ScenarioShift {
    price_shift: dec!(0.05),
    months_shift: -2,
};

impl ScenarioShift {
    /// Apply this shift to a facts record. The holding window never
    /// drops below one month.
    pub fn apply(&self, facts: &AuctionFacts) -> AuctionFacts {
        let months = (i64::from(facts.estimated_months_to_resale)
            + i64::from(self.months_shift))
        .max(1) as u32;

        AuctionFacts {
            market_value: facts.market_value * (dec!(1) + self.price_shift),
            estimated_months_to_resale: months,
            ..facts.clone()
        }
    }
}

/// Base case bracketed by the standard pessimistic/optimistic shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutlook {
    pub pessimistic: InvestmentResult,
    pub expected: InvestmentResult,
    pub optimistic: InvestmentResult,
}

/// Evaluate the base case and both standard shifts.
pub fn outlook(facts: &AuctionFacts, settings: &RateSettings) -> ScenarioOutlook {
    ScenarioOutlook {
        pessimistic: evaluate(&PESSIMISTIC.apply(facts), settings),
        expected: evaluate(facts, settings),
        optimistic: evaluate(&OPTIMISTIC.apply(facts), settings),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_shift_scales_market_value() {
        let facts = AuctionFacts::sample();
        let down = PESSIMISTIC.apply(&facts);
        assert_eq!(down.market_value, dec!(162000));
        let up = OPTIMISTIC.apply(&facts);
        assert_eq!(up.market_value, dec!(189000));
    }

    #[test]
    fn test_months_shift_applies() {
        let facts = AuctionFacts::sample();
        assert_eq!(PESSIMISTIC.apply(&facts).estimated_months_to_resale, 16);
        assert_eq!(OPTIMISTIC.apply(&facts).estimated_months_to_resale, 10);
    }

    #[test]
    fn test_months_floor_at_one() {
        let facts = AuctionFacts {
            estimated_months_to_resale: 2,
            ..AuctionFacts::sample()
        };
        let shift = ScenarioShift {
            price_shift: Decimal::ZERO,
            months_shift: -6,
        };
        assert_eq!(shift.apply(&facts).estimated_months_to_resale, 1);
    }

    #[test]
    fn test_shift_leaves_other_fields_untouched() {
        let facts = AuctionFacts::sample();
        let shifted = PESSIMISTIC.apply(&facts);
        assert_eq!(shifted.bid, facts.bid);
        assert_eq!(shifted.legal_fees_input, facts.legal_fees_input);
        assert_eq!(shifted.rgi_info, facts.rgi_info);
    }

    #[test]
    fn test_outlook_ordering() {
        // With sane inputs the optimistic profit dominates the base case,
        // which dominates the pessimistic one.
        let facts = AuctionFacts::sample();
        let o = outlook(&facts, &RateSettings::default());
        assert!(o.optimistic.projected_profit > o.expected.projected_profit);
        assert!(o.expected.projected_profit > o.pessimistic.projected_profit);
    }

    #[test]
    fn test_outlook_expected_matches_direct_evaluation() {
        let facts = AuctionFacts::sample();
        let settings = RateSettings::default();
        let o = outlook(&facts, &settings);
        assert_eq!(o.expected, evaluate(&facts, &settings));
    }
}
