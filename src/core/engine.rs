use tracing::debug;

use super::types::{ComparisonOutcome, InputParameters, YearlyOutcome};
use super::valuation::{compute_locked_fund_value, personal_path_after_withdrawal};

/// Longest horizon or search ceiling the collaborator layer accepts.
pub const MAX_BREAKEVEN_SEARCH_YEARS: u32 = 100;

/// First year after lockup in which withdrawing at lockup and investing personally
/// is worth at least as much, after tax, as staying in the fund.
///
/// `None` means no crossing within `max_years`; it says nothing about later years.
pub fn find_breakeven_year(
    principal: f64,
    fund_net_return: f64,
    personal_return: f64,
    tax_rate: f64,
    monthly_contribution: f64,
    max_years: u32,
    lockup_years: u32,
) -> Option<u32> {
    let withdrawn =
        compute_locked_fund_value(principal, fund_net_return, lockup_years, monthly_contribution);

    (lockup_years.saturating_add(1)..=max_years).find(|&year| {
        let fund_value =
            compute_locked_fund_value(principal, fund_net_return, year, monthly_contribution);
        let personal = personal_path_after_withdrawal(
            withdrawn,
            personal_return,
            year - lockup_years,
            tax_rate,
            monthly_contribution,
        );
        personal.aftertax >= fund_value
    })
}

pub fn run_comparison(inputs: &InputParameters) -> ComparisonOutcome {
    let fund_net_return = inputs.fund_net_return();
    let personal_effective_return = inputs.personal_effective_return();
    let lockup = inputs.lockup_years;

    let withdrawn = compute_locked_fund_value(
        inputs.principal,
        fund_net_return,
        lockup,
        inputs.monthly_contribution,
    );

    let mut yearly = Vec::with_capacity(inputs.horizon_years as usize);
    let mut breakeven_year = None;

    for year in 1..=inputs.horizon_years {
        let fund_value = compute_locked_fund_value(
            inputs.principal,
            fund_net_return,
            year,
            inputs.monthly_contribution,
        );

        // Locked money cannot diverge from the fund and nothing has been sold yet.
        let (personal_value_pretax, personal_value_aftertax) = if year <= lockup {
            (fund_value, fund_value)
        } else {
            let path = personal_path_after_withdrawal(
                withdrawn,
                personal_effective_return,
                year - lockup,
                inputs.capital_gains_tax_rate,
                inputs.monthly_contribution,
            );
            (path.pretax, path.aftertax)
        };

        let fund_wins = fund_value > personal_value_aftertax;
        if breakeven_year.is_none() && !fund_wins && year > lockup {
            breakeven_year = Some(year);
        }

        yearly.push(YearlyOutcome {
            year,
            fund_value,
            personal_value_pretax,
            personal_value_aftertax,
            fund_wins,
        });
    }

    let outcome = ComparisonOutcome {
        inputs: *inputs,
        yearly,
        breakeven_year,
        fund_net_return,
        personal_effective_return,
    };

    debug!(
        horizon = inputs.horizon_years,
        lockup,
        breakeven_year = ?outcome.breakeven_year,
        winner = ?outcome.winner(),
        "comparison complete"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Winner;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> InputParameters {
        InputParameters {
            principal: 0.0,
            monthly_contribution: 1_571.0,
            fund_gross_return: 0.08,
            fund_management_fee: 0.0035,
            fund_return_is_net: false,
            personal_return: 0.10,
            capital_gains_tax_rate: 0.25,
            annual_tax_drag: 0.003,
            include_tax_drag: false,
            horizon_years: 20,
            lockup_years: 10,
        }
    }

    fn first_personal_year_after_lockup(outcome: &ComparisonOutcome) -> Option<u32> {
        outcome
            .yearly
            .iter()
            .find(|year| year.year > outcome.inputs.lockup_years && !year.fund_wins)
            .map(|year| year.year)
    }

    #[test]
    fn reference_scenario_respects_lockup_and_breakeven_bounds() {
        let inputs = sample_inputs();
        let outcome = run_comparison(&inputs);

        assert_eq!(outcome.yearly.len(), 20);
        let at_lockup = &outcome.yearly[9];
        assert_eq!(at_lockup.year, 10);
        assert_eq!(
            at_lockup.fund_value,
            compute_locked_fund_value(0.0, outcome.fund_net_return, 10, 1_571.0)
        );

        for year in &outcome.yearly[..10] {
            assert_eq!(year.personal_value_pretax, year.fund_value);
            assert_eq!(year.personal_value_aftertax, year.fund_value);
        }

        if let Some(year) = outcome.breakeven_year {
            assert!(year > 10 && year <= 20, "breakeven {year} out of range");
        }
    }

    #[test]
    fn yearly_series_is_ascending_without_gaps() {
        let outcome = run_comparison(&sample_inputs());
        for (index, year) in outcome.yearly.iter().enumerate() {
            assert_eq!(year.year, index as u32 + 1);
        }
    }

    #[test]
    fn personal_path_wins_right_after_lockup_when_untaxed_and_faster() {
        let mut inputs = sample_inputs();
        inputs.capital_gains_tax_rate = 0.0;
        inputs.personal_return = 0.15;
        let outcome = run_comparison(&inputs);
        assert_eq!(outcome.breakeven_year, Some(11));
        assert_eq!(outcome.winner(), Winner::Personal);
    }

    #[test]
    fn slower_personal_return_never_breaks_even() {
        let mut inputs = sample_inputs();
        inputs.personal_return = 0.05;
        let outcome = run_comparison(&inputs);
        assert_eq!(outcome.breakeven_year, None);
        assert!(outcome.yearly[10..].iter().all(|year| year.fund_wins));
        assert_eq!(outcome.winner(), Winner::Fund);
        assert_eq!(
            find_breakeven_year(0.0, outcome.fund_net_return, 0.05, 0.25, 1_571.0, 100, 10),
            None
        );
    }

    #[test]
    fn empty_inputs_tie_at_zero() {
        let mut inputs = sample_inputs();
        inputs.monthly_contribution = 0.0;
        let outcome = run_comparison(&inputs);
        assert!(outcome.yearly.iter().all(|year| year.fund_value == 0.0));
        assert_eq!(outcome.winner(), Winner::Tie);
        // 0 >= 0 right after lockup counts as breaking even.
        assert_eq!(outcome.breakeven_year, Some(11));
    }

    #[test]
    fn horizon_inside_lockup_has_no_breakeven() {
        let mut inputs = sample_inputs();
        inputs.horizon_years = 8;
        inputs.personal_return = 0.30;
        let outcome = run_comparison(&inputs);
        assert_eq!(outcome.yearly.len(), 8);
        assert_eq!(outcome.breakeven_year, None);
        assert_eq!(outcome.winner(), Winner::Tie);
    }

    #[test]
    fn tax_drag_lowers_personal_values() {
        let mut inputs = sample_inputs();
        let without_drag = run_comparison(&inputs);
        inputs.include_tax_drag = true;
        let with_drag = run_comparison(&inputs);
        assert!(with_drag.personal_effective_return < without_drag.personal_effective_return);
        assert!(with_drag.final_personal_value() < without_drag.final_personal_value());
        assert_eq!(with_drag.final_fund_value(), without_drag.final_fund_value());
    }

    #[test]
    fn oracle_first_post_lockup_year_without_contributions() {
        let mut inputs = sample_inputs();
        inputs.principal = 10_000.0;
        inputs.monthly_contribution = 0.0;
        inputs.fund_gross_return = 0.05;
        inputs.fund_return_is_net = true;
        inputs.personal_return = 0.10;
        inputs.capital_gains_tax_rate = 0.25;
        inputs.lockup_years = 2;
        inputs.horizon_years = 3;

        // Withdraw 10000 * 1.05^2 = 11025, grow 10% -> 12127.5, tax 25% of 1102.5
        let outcome = run_comparison(&inputs);
        let year3 = &outcome.yearly[2];
        assert_approx_tol(year3.fund_value, 11_576.25, 1e-9);
        assert_approx_tol(year3.personal_value_pretax, 12_127.5, 1e-9);
        assert_approx_tol(year3.personal_value_aftertax, 11_851.875, 1e-9);
        assert!(!year3.fund_wins);
        assert_eq!(outcome.breakeven_year, Some(3));
    }

    #[test]
    fn breakeven_search_stops_at_ceiling() {
        assert_eq!(find_breakeven_year(0.0, 0.07, 0.50, 0.25, 100.0, 10, 10), None);
        assert_eq!(find_breakeven_year(0.0, 0.07, 0.50, 0.25, 100.0, 11, 10), Some(11));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_breakeven_search_matches_comparison_series(
            principal in 0u32..500_000,
            monthly in 0u32..5_000,
            fund_bp in 0u32..1_200,
            fee_bp in 0u32..150,
            personal_bp in 0u32..1_800,
            tax_bp in 0u32..5_000,
            drag_bp in 0u32..100,
            include_drag in proptest::bool::ANY,
            lockup in 1u32..16,
            horizon in 1u32..41
        ) {
            let inputs = InputParameters {
                principal: principal as f64,
                monthly_contribution: monthly as f64,
                fund_gross_return: fund_bp as f64 / 10_000.0,
                fund_management_fee: fee_bp as f64 / 10_000.0,
                fund_return_is_net: false,
                personal_return: personal_bp as f64 / 10_000.0,
                capital_gains_tax_rate: tax_bp as f64 / 10_000.0,
                annual_tax_drag: drag_bp as f64 / 10_000.0,
                include_tax_drag: include_drag,
                horizon_years: horizon,
                lockup_years: lockup,
            };
            let outcome = run_comparison(&inputs);

            let searched = find_breakeven_year(
                inputs.principal,
                outcome.fund_net_return,
                outcome.personal_effective_return,
                inputs.capital_gains_tax_rate,
                inputs.monthly_contribution,
                inputs.horizon_years,
                inputs.lockup_years,
            );
            prop_assert_eq!(searched, outcome.breakeven_year);
            prop_assert_eq!(first_personal_year_after_lockup(&outcome), outcome.breakeven_year);
            if let Some(year) = outcome.breakeven_year {
                prop_assert!(year > lockup && year <= horizon);
            }
        }

        #[test]
        fn prop_series_invariants_hold(
            principal in 0u32..500_000,
            monthly in 0u32..5_000,
            fund_bp in 0u32..1_200,
            personal_bp in 0u32..1_800,
            tax_bp in 0u32..9_900,
            lockup in 1u32..16,
            horizon in 1u32..41
        ) {
            let mut inputs = sample_inputs();
            inputs.principal = principal as f64;
            inputs.monthly_contribution = monthly as f64;
            inputs.fund_gross_return = fund_bp as f64 / 10_000.0;
            inputs.personal_return = personal_bp as f64 / 10_000.0;
            inputs.capital_gains_tax_rate = tax_bp as f64 / 10_000.0;
            inputs.lockup_years = lockup;
            inputs.horizon_years = horizon;

            let outcome = run_comparison(&inputs);
            prop_assert_eq!(outcome.yearly.len(), horizon as usize);
            for year in &outcome.yearly {
                prop_assert!(year.fund_value >= 0.0);
                prop_assert!(year.personal_value_pretax >= 0.0);
                prop_assert!(year.personal_value_aftertax >= 0.0);
                prop_assert_eq!(year.fund_wins, year.fund_value > year.personal_value_aftertax);
                if year.year <= lockup {
                    prop_assert_eq!(year.personal_value_pretax, year.fund_value);
                    prop_assert_eq!(year.personal_value_aftertax, year.fund_value);
                } else {
                    prop_assert!(year.personal_value_aftertax <= year.personal_value_pretax + 1e-6);
                }
            }
        }
    }
}
