use tracing::debug;

use super::engine::find_breakeven_year;
use super::types::{InputParameters, SensitivityCell, SensitivityMatrix};

pub const DEFAULT_SENSITIVITY_CEILING_YEARS: u32 = 50;
pub const DEFAULT_SENSITIVITY_PERSONAL_RETURNS: [f64; 8] =
    [0.08, 0.09, 0.10, 0.11, 0.12, 0.13, 0.14, 0.15];
pub const DEFAULT_SENSITIVITY_TAX_RATES: [f64; 5] = [0.15, 0.20, 0.25, 0.30, 0.35];

/// Assumptions held fixed across every cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityConfig {
    pub principal: f64,
    pub fund_net_return: f64,
    pub monthly_contribution: f64,
    pub lockup_years: u32,
    pub ceiling_years: u32,
}

impl SensitivityConfig {
    pub fn from_inputs(inputs: &InputParameters, ceiling_years: u32) -> Self {
        Self {
            principal: inputs.principal,
            fund_net_return: inputs.fund_net_return(),
            monthly_contribution: inputs.monthly_contribution,
            lockup_years: inputs.lockup_years,
            ceiling_years,
        }
    }
}

pub fn build_sensitivity_matrix(
    config: SensitivityConfig,
    personal_returns: &[f64],
    tax_rates: &[f64],
) -> SensitivityMatrix {
    let cells = personal_returns
        .iter()
        .map(|&personal_return| {
            tax_rates
                .iter()
                .map(|&tax_rate| {
                    find_breakeven_year(
                        config.principal,
                        config.fund_net_return,
                        personal_return,
                        tax_rate,
                        config.monthly_contribution,
                        config.ceiling_years,
                        config.lockup_years,
                    )
                    .map_or(SensitivityCell::BeyondCeiling, SensitivityCell::Year)
                })
                .collect()
        })
        .collect();

    debug!(
        rows = personal_returns.len(),
        columns = tax_rates.len(),
        ceiling = config.ceiling_years,
        "sensitivity grid built"
    );

    SensitivityMatrix {
        personal_returns: personal_returns.to_vec(),
        tax_rates: tax_rates.to_vec(),
        ceiling_years: config.ceiling_years,
        cells,
    }
}
