//! Break-even bid solver.
//!
//! Inverts the cost model: holding the resale price and every non-bid
//! cost fixed, finds the highest bid at which pre-tax gross profit is
//! exactly zero. Each unit of bid costs `1 + proportional fees`, so the
//! budget left after commission and fixed costs divides out linearly.
//!
//! Deliberately pre-tax: capital-gains tax applies only to positive
//! profit, which is exactly zero at break-even by definition on the
//! evaluator side; the solver mirrors the reference behavior and leaves
//! tax out of the margin entirely.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::fees::{parse_fee, percent_rate};
use crate::types::{AuctionFacts, RateSettings};

/// Highest bid at which projected gross profit is zero. Floors at zero:
/// a negative budget means no bid is profitable.
pub fn max_bid_for_break_even(facts: &AuctionFacts, settings: &RateSettings) -> Decimal {
    // Portion of cost that scales with the bid.
    let variable_rate = (settings.auctioneer_commission_rate
        + settings.itbi_rate
        + settings.registry_rate)
        / dec!(100);

    // A percentage legal fee scales with the bid; a flat one does not.
    let (legal_fee_rate, fixed_legal_fee) = match percent_rate(&facts.legal_fees_input) {
        Some(rate) => (rate, Decimal::ZERO),
        None => (Decimal::ZERO, parse_fee(&facts.legal_fees_input, Decimal::ZERO)),
    };

    let debts_assumed = facts.iptu_responsible.assumed_share(facts.iptu_debt)
        + facts.condo_responsible.assumed_share(facts.condo_debt)
        + facts.other_debts_responsible.assumed_share(facts.other_debts);

    let holding_costs = (facts.monthly_condo_fee + facts.monthly_tax_fee)
        * Decimal::from(facts.estimated_months_to_resale);

    let fixed_costs = facts.estimated_renovation_cost
        + holding_costs
        + debts_assumed
        + fixed_legal_fee
        + facts.eviction_cost;

    let selling_commission = facts.market_value * facts.selling_commission_rate / dec!(100);

    // Cash left to cover the bid plus its proportional fees.
    let available_budget = facts.market_value - selling_commission - fixed_costs;

    let total_variable_rate = dec!(1) + variable_rate + legal_fee_rate;
    if total_variable_rate <= Decimal::ZERO {
        // Only reachable with pathological negative rates; treat like an
        // exhausted budget rather than dividing through zero.
        return Decimal::ZERO;
    }

    (available_budget / total_variable_rate).max(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::evaluate;
    use crate::types::DebtResponsibility;

    /// Gross (pre-tax) profit reconstructed from an evaluation.
    fn gross_profit(facts: &AuctionFacts, settings: &RateSettings) -> Decimal {
        let r = evaluate(facts, settings);
        facts.market_value - r.total_investment - r.breakdown.selling_commission
    }

    #[test]
    fn test_worked_example_ceiling() {
        // market 180k, 5% selling commission → 171k budget;
        // each bid unit costs 1 + 0.09 (fees) + 0.04 (legal) = 1.13.
        let facts = AuctionFacts::sample();
        let max_bid = max_bid_for_break_even(&facts, &RateSettings::default());
        assert_eq!(max_bid.round_dp(2), dec!(151327.43));
    }

    #[test]
    fn test_bidding_at_ceiling_breaks_even() {
        let settings = RateSettings::default();
        let base = AuctionFacts {
            iptu_debt: dec!(6000),
            iptu_responsible: DebtResponsibility::Shared,
            eviction_cost: dec!(2500),
            monthly_condo_fee: dec!(450),
            monthly_tax_fee: dec!(120),
            estimated_renovation_cost: dec!(15000),
            ..AuctionFacts::sample()
        };

        let ceiling = max_bid_for_break_even(&base, &settings);
        let at_ceiling = AuctionFacts { bid: ceiling, ..base };

        assert!(gross_profit(&at_ceiling, &settings).abs() < dec!(0.000001));
    }

    #[test]
    fn test_ceiling_with_flat_legal_fee() {
        let settings = RateSettings::default();
        let base = AuctionFacts {
            legal_fees_input: "R$ 3.000,00".to_string(),
            ..AuctionFacts::sample()
        };

        let ceiling = max_bid_for_break_even(&base, &settings);
        let at_ceiling = AuctionFacts { bid: ceiling, ..base };

        // (171000 - 3000) / 1.09
        assert_eq!(ceiling.round_dp(2), dec!(154128.44));
        assert!(gross_profit(&at_ceiling, &settings).abs() < dec!(0.000001));
    }

    #[test]
    fn test_negative_budget_floors_at_zero() {
        let facts = AuctionFacts {
            market_value: dec!(10000),
            estimated_renovation_cost: dec!(50000),
            ..AuctionFacts::sample()
        };
        assert_eq!(
            max_bid_for_break_even(&facts, &RateSettings::default()),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_zero_market_value_means_zero_ceiling() {
        let facts = AuctionFacts {
            market_value: Decimal::ZERO,
            ..AuctionFacts::sample()
        };
        assert_eq!(
            max_bid_for_break_even(&facts, &RateSettings::default()),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_fixed_costs_shrink_the_ceiling() {
        let settings = RateSettings::default();
        let clean = AuctionFacts::sample();
        let burdened = AuctionFacts {
            condo_debt: dec!(20000),
            condo_responsible: DebtResponsibility::Purchaser,
            ..AuctionFacts::sample()
        };
        assert!(
            max_bid_for_break_even(&burdened, &settings)
                < max_bid_for_break_even(&clean, &settings)
        );
    }

    #[test]
    fn test_seller_debts_do_not_shrink_the_ceiling() {
        let settings = RateSettings::default();
        let clean = AuctionFacts::sample();
        let seller_owes = AuctionFacts {
            condo_debt: dec!(20000),
            condo_responsible: DebtResponsibility::Seller,
            ..AuctionFacts::sample()
        };
        assert_eq!(
            max_bid_for_break_even(&seller_owes, &settings),
            max_bid_for_break_even(&clean, &settings)
        );
    }

    #[test]
    fn test_solver_ignores_capital_gains_tax() {
        // Break-even is defined pre-tax: the tax rate must not move it.
        let facts = AuctionFacts::sample();
        let lo_tax = RateSettings {
            capital_gains_tax_rate: Decimal::ZERO,
            ..RateSettings::default()
        };
        let hi_tax = RateSettings {
            capital_gains_tax_rate: dec!(40),
            ..RateSettings::default()
        };
        assert_eq!(
            max_bid_for_break_even(&facts, &lo_tax),
            max_bid_for_break_even(&facts, &hi_tax)
        );
    }

    #[test]
    fn test_empty_legal_fee_input() {
        let facts = AuctionFacts {
            legal_fees_input: String::new(),
            ..AuctionFacts::sample()
        };
        // 171000 / 1.09
        let ceiling = max_bid_for_break_even(&facts, &RateSettings::default());
        assert_eq!(ceiling.round_dp(2), dec!(156880.73));
    }
}
