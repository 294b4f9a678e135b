use serde::{Deserialize, Serialize};

use super::types::InputParameters;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Conservative,
    Aggressive,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Conservative, Preset::Aggressive];

    pub fn overrides(self) -> PresetOverrides {
        match self {
            Preset::Conservative => PresetOverrides {
                fund_gross_return: Some(0.07),
                personal_return: Some(0.08),
                horizon_years: Some(10),
            },
            Preset::Aggressive => PresetOverrides {
                fund_gross_return: Some(0.08),
                personal_return: Some(0.12),
                horizon_years: Some(25),
            },
        }
    }
}

/// Partial set of input values a preset replaces; `None` leaves a field alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetOverrides {
    pub fund_gross_return: Option<f64>,
    pub personal_return: Option<f64>,
    pub horizon_years: Option<u32>,
}

impl PresetOverrides {
    pub fn apply(self, inputs: InputParameters) -> InputParameters {
        InputParameters {
            fund_gross_return: self.fund_gross_return.unwrap_or(inputs.fund_gross_return),
            personal_return: self.personal_return.unwrap_or(inputs.personal_return),
            horizon_years: self.horizon_years.unwrap_or(inputs.horizon_years),
            ..inputs
        }
    }
}
