use super::types::{RequiredReturn, RequiredReturnPoint};

pub const DEFAULT_REQUIRED_RETURN_HORIZONS: [u32; 6] = [5, 10, 15, 20, 25, 30];
pub const DEFAULT_REQUIRED_RETURN_CURVE_YEARS: u32 = 40;

/// Personal return `r` solving `(1 + f)^T = t + (1 - t) * (1 + r)^T` for a single
/// lump sum held `years` years and taxed on its gain at sale.
pub fn compute_required_return(fund_net_return: f64, tax_rate: f64, years: u32) -> RequiredReturn {
    if years == 0 || !fund_net_return.is_finite() || !tax_rate.is_finite() {
        return RequiredReturn::Invalid;
    }

    let denominator = 1.0 - tax_rate;
    if denominator <= 0.0 {
        return RequiredReturn::Unbounded;
    }

    let numerator = (1.0 + fund_net_return).powi(years as i32) - tax_rate;
    if numerator <= 0.0 {
        return RequiredReturn::TriviallySatisfied;
    }

    RequiredReturn::Rate((numerator / denominator).powf(1.0 / years as f64) - 1.0)
}

pub fn required_return_point(fund_net_return: f64, tax_rate: f64, years: u32) -> RequiredReturnPoint {
    let required_return = compute_required_return(fund_net_return, tax_rate, years);
    RequiredReturnPoint {
        horizon_years: years,
        fund_net_return,
        tax_rate,
        required_return,
        alpha_required: required_return.rate().map(|rate| rate - fund_net_return),
    }
}

/// One point per horizon, in the order given.
pub fn build_required_return_table(
    fund_net_return: f64,
    tax_rate: f64,
    horizons: &[u32],
) -> Vec<RequiredReturnPoint> {
    horizons
        .iter()
        .map(|&years| required_return_point(fund_net_return, tax_rate, years))
        .collect()
}

/// Points for every horizon from 1 to `max_horizon` inclusive.
pub fn required_return_curve(
    fund_net_return: f64,
    tax_rate: f64,
    max_horizon: u32,
) -> Vec<RequiredReturnPoint> {
    (1..=max_horizon)
        .map(|years| required_return_point(fund_net_return, tax_rate, years))
        .collect()
}
