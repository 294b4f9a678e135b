use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParameters {
    pub principal: f64,
    pub monthly_contribution: f64,
    pub fund_gross_return: f64,
    pub fund_management_fee: f64,
    pub fund_return_is_net: bool,
    pub personal_return: f64,
    pub capital_gains_tax_rate: f64,
    pub annual_tax_drag: f64,
    pub include_tax_drag: bool,
    pub horizon_years: u32,
    pub lockup_years: u32,
}

impl InputParameters {
    /// Fund growth rate after the management fee, unless the stated return is already net.
    pub fn fund_net_return(&self) -> f64 {
        if self.fund_return_is_net {
            return self.fund_gross_return;
        }
        (1.0 + self.fund_gross_return) * (1.0 - self.fund_management_fee) - 1.0
    }

    pub fn personal_effective_return(&self) -> f64 {
        if self.include_tax_drag {
            self.personal_return - self.annual_tax_drag
        } else {
            self.personal_return
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyOutcome {
    pub year: u32,
    pub fund_value: f64,
    pub personal_value_pretax: f64,
    pub personal_value_aftertax: f64,
    pub fund_wins: bool,
}

impl YearlyOutcome {
    pub fn difference(&self) -> f64 {
        self.personal_value_aftertax - self.fund_value
    }

    /// Difference as a fraction of the fund value; zero when the fund is empty.
    pub fn difference_pct(&self) -> f64 {
        if self.fund_value == 0.0 {
            return 0.0;
        }
        self.difference() / self.fund_value
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Fund,
    Personal,
    Tie,
}

impl Winner {
    pub fn from_difference(difference: f64) -> Self {
        if difference > 0.0 {
            Winner::Personal
        } else if difference < 0.0 {
            Winner::Fund
        } else {
            Winner::Tie
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Winner::Fund => "Locked fund",
            Winner::Personal => "Personal investment",
            Winner::Tie => "Tie",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub inputs: InputParameters,
    pub yearly: Vec<YearlyOutcome>,
    pub breakeven_year: Option<u32>,
    pub fund_net_return: f64,
    pub personal_effective_return: f64,
}

impl ComparisonOutcome {
    pub fn final_fund_value(&self) -> f64 {
        self.yearly
            .last()
            .map_or(self.inputs.principal, |year| year.fund_value)
    }

    pub fn final_personal_value(&self) -> f64 {
        self.yearly
            .last()
            .map_or(self.inputs.principal, |year| year.personal_value_aftertax)
    }

    pub fn final_difference(&self) -> f64 {
        self.final_personal_value() - self.final_fund_value()
    }

    pub fn winner(&self) -> Winner {
        Winner::from_difference(self.final_difference())
    }
}

/// Outcome of inverting the lump-sum break-even equation for the personal return.
///
/// `Rate` carries the finite answer. The other variants separate the cases the
/// closed form cannot answer with a number.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RequiredReturn {
    Rate(f64),
    /// The fund grows so little that even losing the whole personal stake matches it.
    TriviallySatisfied,
    /// Tax takes the entire gain, so no finite return can catch up.
    Unbounded,
    /// Zero horizon or non-finite rates.
    Invalid,
}

impl RequiredReturn {
    pub fn rate(self) -> Option<f64> {
        match self {
            RequiredReturn::Rate(rate) => Some(rate),
            _ => None,
        }
    }

    /// Single-number form used by the reference charts: every non-rate case is +inf.
    pub fn legacy_value(self) -> f64 {
        self.rate().unwrap_or(f64::INFINITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredReturnPoint {
    pub horizon_years: u32,
    pub fund_net_return: f64,
    pub tax_rate: f64,
    pub required_return: RequiredReturn,
    pub alpha_required: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "year", rename_all = "camelCase")]
pub enum SensitivityCell {
    Year(u32),
    BeyondCeiling,
}

impl SensitivityCell {
    pub fn year(self) -> Option<u32> {
        match self {
            SensitivityCell::Year(year) => Some(year),
            SensitivityCell::BeyondCeiling => None,
        }
    }
}

/// Break-even years over personal return (rows) by tax rate (columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityMatrix {
    pub personal_returns: Vec<f64>,
    pub tax_rates: Vec<f64>,
    pub ceiling_years: u32,
    pub cells: Vec<Vec<SensitivityCell>>,
}

impl SensitivityMatrix {
    pub fn cell(&self, return_index: usize, tax_index: usize) -> Option<SensitivityCell> {
        self.cells.get(return_index)?.get(tax_index).copied()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}
