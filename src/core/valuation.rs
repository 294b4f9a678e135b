const MONTHS_PER_YEAR: u32 = 12;

/// Equivalent monthly rate for an annually compounded rate.
pub(crate) fn monthly_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / MONTHS_PER_YEAR as f64) - 1.0
}

fn growth_factor(annual_rate: f64, years: u32) -> f64 {
    (1.0 + annual_rate).powi(years as i32)
}

/// Future value of `years * 12` end-of-month payments of `monthly_contribution`.
fn contribution_future_value(monthly_contribution: f64, annual_rate: f64, years: u32) -> f64 {
    if monthly_contribution <= 0.0 || years == 0 {
        return 0.0;
    }

    let months = years * MONTHS_PER_YEAR;
    let rate = monthly_rate(annual_rate);
    if rate.abs() < 1e-12 {
        return monthly_contribution * months as f64;
    }

    monthly_contribution * ((1.0 + rate).powi(months as i32) - 1.0) / rate
}

fn after_tax(cost_basis: f64, pretax_value: f64, tax_rate: f64) -> f64 {
    cost_basis + (pretax_value - cost_basis) * (1.0 - tax_rate)
}

pub fn compute_locked_fund_value(
    principal: f64,
    net_return: f64,
    years: u32,
    monthly_contribution: f64,
) -> f64 {
    principal * growth_factor(net_return, years)
        + contribution_future_value(monthly_contribution, net_return, years)
}

pub fn compute_personal_value_pretax(
    principal: f64,
    return_rate: f64,
    years: u32,
    monthly_contribution: f64,
) -> f64 {
    principal * growth_factor(return_rate, years)
        + contribution_future_value(monthly_contribution, return_rate, years)
}

/// Value after selling everything at the end of `years` and paying capital-gains tax.
///
/// The principal is a single lot taxed on its own gain. Each monthly contribution
/// is its own lot: the k-th of `n` payments compounds for `n - k` months, so
/// later lots carry smaller gains. Summing `m + (m * (1 + i)^(n - k) - m) * (1 - t)`
/// over all lots collapses to `basis + (annuity - basis) * (1 - t)`, which is
/// what gets evaluated here.
pub fn compute_personal_value_aftertax(
    principal: f64,
    return_rate: f64,
    years: u32,
    tax_rate: f64,
    monthly_contribution: f64,
) -> f64 {
    let lump_sum = if principal > 0.0 {
        after_tax(
            principal,
            principal * growth_factor(return_rate, years),
            tax_rate,
        )
    } else {
        0.0
    };

    let contributions = if monthly_contribution > 0.0 && years > 0 {
        let basis = monthly_contribution * (years * MONTHS_PER_YEAR) as f64;
        after_tax(
            basis,
            contribution_future_value(monthly_contribution, return_rate, years),
            tax_rate,
        )
    } else {
        0.0
    };

    lump_sum + contributions
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PersonalPath {
    pub pretax: f64,
    pub aftertax: f64,
}

/// Personal account `years_invested` years after the locked balance was withdrawn.
///
/// The withdrawn amount is one lot taxed once on its total gain; new contributions
/// made after withdrawal are taxed per lot.
pub(crate) fn personal_path_after_withdrawal(
    withdrawn: f64,
    return_rate: f64,
    years_invested: u32,
    tax_rate: f64,
    monthly_contribution: f64,
) -> PersonalPath {
    let lump_sum_pretax = compute_personal_value_pretax(withdrawn, return_rate, years_invested, 0.0);
    let contributions_pretax =
        compute_personal_value_pretax(0.0, return_rate, years_invested, monthly_contribution);
    let contributions_aftertax = compute_personal_value_aftertax(
        0.0,
        return_rate,
        years_invested,
        tax_rate,
        monthly_contribution,
    );

    PersonalPath {
        pretax: lump_sum_pretax + contributions_pretax,
        aftertax: after_tax(withdrawn, lump_sum_pretax, tax_rate) + contributions_aftertax,
    }
}
