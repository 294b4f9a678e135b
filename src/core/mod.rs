mod engine;
mod presets;
mod sensitivity;
mod solver;
mod types;
mod valuation;

pub use engine::{MAX_BREAKEVEN_SEARCH_YEARS, find_breakeven_year, run_comparison};
pub use presets::{Preset, PresetOverrides};
pub use sensitivity::{
    DEFAULT_SENSITIVITY_CEILING_YEARS, DEFAULT_SENSITIVITY_PERSONAL_RETURNS,
    DEFAULT_SENSITIVITY_TAX_RATES, SensitivityConfig, build_sensitivity_matrix,
};
pub use solver::{
    DEFAULT_REQUIRED_RETURN_CURVE_YEARS, DEFAULT_REQUIRED_RETURN_HORIZONS,
    build_required_return_table, compute_required_return, required_return_curve,
    required_return_point,
};
pub use types::{
    ComparisonOutcome, InputParameters, RequiredReturn, RequiredReturnPoint, SensitivityCell,
    SensitivityMatrix, Winner, YearlyOutcome,
};
pub use valuation::{
    compute_locked_fund_value, compute_personal_value_aftertax, compute_personal_value_pretax,
};
