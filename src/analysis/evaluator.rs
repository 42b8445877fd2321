//! Investment evaluation.
//!
//! Computes the full cost/profit picture for one auctioned property:
//! acquisition fees proportional to the bid, assumed debts, holding
//! costs over the resale window, capital-gains tax on positive profit,
//! ROI, and the break-even resale price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::fees::parse_fee;
use crate::types::{AuctionFacts, CostBreakdown, InvestmentResult, RateSettings};

/// Evaluate an auction opportunity.
///
/// Pure and total: defined for all inputs, including zero and negative
/// edge values. Divisions are guarded — a zero denominator yields a zero
/// result, never an error. Capital-gains tax applies only to positive
/// gross profit; losses are not tax-credited.
pub fn evaluate(facts: &AuctionFacts, settings: &RateSettings) -> InvestmentResult {
    let bid = facts.bid;

    // Bid-proportional acquisition fees.
    let commission = bid * settings.auctioneer_commission_rate / dec!(100);
    let itbi = bid * settings.itbi_rate / dec!(100);
    let registry = bid * settings.registry_rate / dec!(100);
    let legal_fees = parse_fee(&facts.legal_fees_input, bid);

    // Pre-existing debts the purchaser assumes (full / half / none).
    let iptu_assumed = facts.iptu_responsible.assumed_share(facts.iptu_debt);
    let condo_assumed = facts.condo_responsible.assumed_share(facts.condo_debt);
    let other_assumed = facts.other_debts_responsible.assumed_share(facts.other_debts);
    let debts_assumed = iptu_assumed + condo_assumed + other_assumed;

    let acquisition_extras =
        commission + itbi + registry + legal_fees + debts_assumed + facts.eviction_cost;
    let total_acquisition_cost = bid + acquisition_extras;

    let holding_costs = (facts.monthly_condo_fee + facts.monthly_tax_fee)
        * Decimal::from(facts.estimated_months_to_resale);

    let total_investment =
        total_acquisition_cost + facts.estimated_renovation_cost + holding_costs;

    let selling_commission = facts.market_value * facts.selling_commission_rate / dec!(100);
    let gross_profit = facts.market_value - total_investment - selling_commission;

    let capital_gains_tax = if gross_profit > Decimal::ZERO {
        gross_profit * settings.capital_gains_tax_rate / dec!(100)
    } else {
        Decimal::ZERO
    };
    let projected_profit = gross_profit - capital_gains_tax;

    let roi_percent = if total_investment > Decimal::ZERO {
        projected_profit / total_investment * dec!(100)
    } else {
        Decimal::ZERO
    };

    let annualized_roi = if facts.estimated_months_to_resale > 0 {
        roi_percent / Decimal::from(facts.estimated_months_to_resale) * dec!(12)
    } else {
        Decimal::ZERO
    };

    // Resale price at which pre-tax gross profit is exactly zero.
    // A selling-commission rate at or above 100% leaves no denominator;
    // that degenerate configuration yields zero rather than a panic.
    let commission_headroom = dec!(1) - facts.selling_commission_rate / dec!(100);
    let break_even_price = if commission_headroom > Decimal::ZERO {
        total_investment / commission_headroom
    } else {
        Decimal::ZERO
    };

    InvestmentResult {
        total_acquisition_cost,
        total_investment,
        projected_profit,
        roi_percent,
        annualized_roi,
        break_even_price,
        breakdown: CostBreakdown {
            commission,
            itbi,
            registry,
            legal_fees,
            holding_costs,
            selling_commission,
            debts_assumed,
            eviction_cost: facts.eviction_cost,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DebtResponsibility;

    fn bare_facts(bid: Decimal) -> AuctionFacts {
        AuctionFacts {
            bid,
            legal_fees_input: String::new(),
            selling_commission_rate: Decimal::ZERO,
            estimated_months_to_resale: 0,
            ..Default::default()
        }
    }

    fn zero_rates() -> RateSettings {
        RateSettings {
            auctioneer_commission_rate: Decimal::ZERO,
            itbi_rate: Decimal::ZERO,
            registry_rate: Decimal::ZERO,
            capital_gains_tax_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_worked_example() {
        // bid 100k, market 180k, 4% legal, 5% selling commission,
        // 12 months, rates 5/3/1/15.
        let facts = AuctionFacts::sample();
        let settings = RateSettings::default();

        let r = evaluate(&facts, &settings);

        assert_eq!(r.breakdown.commission, dec!(5000));
        assert_eq!(r.breakdown.itbi, dec!(3000));
        assert_eq!(r.breakdown.registry, dec!(1000));
        assert_eq!(r.breakdown.legal_fees, dec!(4000));
        assert_eq!(r.total_acquisition_cost, dec!(113000));
        assert_eq!(r.total_investment, dec!(113000));
        assert_eq!(r.breakdown.selling_commission, dec!(9000));
        // gross 58000, tax 8700, net 49300
        assert_eq!(r.projected_profit, dec!(49300));
        assert_eq!(r.roi_percent.round_dp(2), dec!(43.63));
        assert_eq!(r.annualized_roi.round_dp(2), dec!(43.63));
    }

    #[test]
    fn test_all_zero_costs_collapse_to_bid() {
        let facts = bare_facts(dec!(80000));
        let r = evaluate(&facts, &zero_rates());
        assert_eq!(r.total_acquisition_cost, dec!(80000));
        assert_eq!(r.total_investment, dec!(80000));
    }

    #[test]
    fn test_zero_bid_is_degenerate_but_defined() {
        let facts = bare_facts(Decimal::ZERO);
        let r = evaluate(&facts, &zero_rates());
        assert_eq!(r.total_acquisition_cost, Decimal::ZERO);
        assert_eq!(r.total_investment, Decimal::ZERO);
        assert_eq!(r.roi_percent, Decimal::ZERO);
    }

    #[test]
    fn test_zero_investment_guards_roi() {
        let facts = AuctionFacts {
            market_value: dec!(50000),
            ..bare_facts(Decimal::ZERO)
        };
        let r = evaluate(&facts, &zero_rates());
        assert_eq!(r.total_investment, Decimal::ZERO);
        // Profit with no investment: ROI guarded to 0, not infinity.
        assert_eq!(r.roi_percent, Decimal::ZERO);
    }

    #[test]
    fn test_zero_months_guards_annualization() {
        let facts = AuctionFacts {
            estimated_months_to_resale: 0,
            market_value: dec!(150000),
            ..AuctionFacts::sample()
        };
        let r = evaluate(&facts, &RateSettings::default());
        assert_eq!(r.annualized_roi, Decimal::ZERO);
        // Holding costs at zero months are simply zero, not an error.
        assert_eq!(r.breakdown.holding_costs, Decimal::ZERO);
    }

    #[test]
    fn test_debt_split_per_responsibility() {
        let facts = AuctionFacts {
            iptu_debt: dec!(12000),
            iptu_responsible: DebtResponsibility::Purchaser,
            condo_debt: dec!(8000),
            condo_responsible: DebtResponsibility::Shared,
            other_debts: dec!(5000),
            other_debts_responsible: DebtResponsibility::Seller,
            ..bare_facts(dec!(100000))
        };
        let r = evaluate(&facts, &zero_rates());
        // 12000 full + 4000 half + 0
        assert_eq!(r.breakdown.debts_assumed, dec!(16000));
        assert_eq!(r.total_acquisition_cost, dec!(116000));
    }

    #[test]
    fn test_eviction_cost_enters_acquisition() {
        let facts = AuctionFacts {
            eviction_cost: dec!(2500),
            ..bare_facts(dec!(100000))
        };
        let r = evaluate(&facts, &zero_rates());
        assert_eq!(r.total_acquisition_cost, dec!(102500));
        assert_eq!(r.breakdown.eviction_cost, dec!(2500));
    }

    #[test]
    fn test_holding_costs_scale_with_months() {
        let facts = AuctionFacts {
            monthly_condo_fee: dec!(600),
            monthly_tax_fee: dec!(150),
            estimated_months_to_resale: 10,
            legal_fees_input: String::new(),
            selling_commission_rate: Decimal::ZERO,
            ..bare_facts(dec!(50000))
        };
        let r = evaluate(&facts, &zero_rates());
        assert_eq!(r.breakdown.holding_costs, dec!(7500));
        assert_eq!(r.total_investment, dec!(57500));
    }

    #[test]
    fn test_flat_legal_fee_parsed_from_locale_literal() {
        let facts = AuctionFacts {
            legal_fees_input: "R$ 1.500,00".to_string(),
            ..bare_facts(dec!(100000))
        };
        let r = evaluate(&facts, &zero_rates());
        assert_eq!(r.breakdown.legal_fees, dec!(1500));
    }

    #[test]
    fn test_losses_are_not_tax_credited() {
        // Market below cost: gross profit negative, tax must be zero.
        let facts = AuctionFacts {
            market_value: dec!(90000),
            ..AuctionFacts::sample()
        };
        let r = evaluate(&facts, &RateSettings::default());
        // gross = 90000 - 113000 - 4500 = -27500; no tax on losses.
        assert_eq!(r.projected_profit, dec!(-27500));
    }

    #[test]
    fn test_higher_bid_costs_more_and_earns_less() {
        let settings = RateSettings::default();
        let low = evaluate(&AuctionFacts::sample(), &settings);
        let high = evaluate(
            &AuctionFacts {
                bid: dec!(110000),
                ..AuctionFacts::sample()
            },
            &settings,
        );
        assert!(high.total_acquisition_cost > low.total_acquisition_cost);
        assert!(high.projected_profit < low.projected_profit);
    }

    #[test]
    fn test_break_even_price_normal_case() {
        let facts = AuctionFacts::sample();
        let r = evaluate(&facts, &RateSettings::default());
        // investment / (1 - 0.05)
        assert_eq!(r.break_even_price.round_dp(2), dec!(118947.37));
        // Reselling exactly at break-even covers investment + commission.
        let commission = r.break_even_price * dec!(0.05);
        assert!((r.break_even_price - commission - r.total_investment).abs() < dec!(0.0001));
    }

    #[test]
    fn test_break_even_price_degenerate_commission() {
        let facts = AuctionFacts {
            selling_commission_rate: dec!(100),
            ..AuctionFacts::sample()
        };
        let r = evaluate(&facts, &RateSettings::default());
        assert_eq!(r.break_even_price, Decimal::ZERO);

        let facts = AuctionFacts {
            selling_commission_rate: dec!(120),
            ..AuctionFacts::sample()
        };
        let r = evaluate(&facts, &RateSettings::default());
        assert_eq!(r.break_even_price, Decimal::ZERO);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let facts = AuctionFacts::sample();
        let settings = RateSettings::default();
        assert_eq!(evaluate(&facts, &settings), evaluate(&facts, &settings));
    }
}
