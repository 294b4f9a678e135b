use std::fmt::Write;

use crate::core::{RequiredReturn, SensitivityCell};

use super::CompareResponse;

const BREAKEVEN_MARKER: &str = "<< break-even";

/// Whole-unit amount with thousands separators, e.g. `₪1,234` or `-₪1,234`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{}", group_thousands(rounded.abs()))
}

/// `value` is a fraction; `0.0762` with two decimals renders as `7.62%`.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

pub(super) fn breakeven_label(year: Option<u32>) -> String {
    match year {
        Some(year) => format!("Year {year}"),
        None => "Never".to_string(),
    }
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{value:.0}");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn signed_currency(value: f64, symbol: &str) -> String {
    if value.round() > 0.0 {
        format!("+{}", format_currency(value, symbol))
    } else {
        format_currency(value, symbol)
    }
}

fn required_return_text(required: RequiredReturn) -> String {
    match required {
        RequiredReturn::Rate(rate) => format_percentage(rate, 2),
        RequiredReturn::TriviallySatisfied => "any".to_string(),
        RequiredReturn::Unbounded => "unreachable".to_string(),
        RequiredReturn::Invalid => "n/a".to_string(),
    }
}

fn sensitivity_text(cell: SensitivityCell, ceiling_years: u32) -> String {
    match cell {
        SensitivityCell::Year(year) => year.to_string(),
        SensitivityCell::BeyondCeiling => format!(">{ceiling_years}"),
    }
}

pub(super) fn render_report(response: &CompareResponse, symbol: &str) -> String {
    let mut out = String::new();
    let summary = &response.summary;

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Winner:               {}", summary.winner_label);
    let _ = writeln!(out, "Break-even:           {}", summary.breakeven_label);
    let _ = writeln!(
        out,
        "Fund net return:      {}",
        format_percentage(summary.fund_net_return, 2)
    );
    let _ = writeln!(
        out,
        "Personal return:      {}",
        format_percentage(summary.personal_effective_return, 2)
    );
    let _ = writeln!(
        out,
        "Final fund value:     {}",
        format_currency(summary.final_fund_value, symbol)
    );
    let _ = writeln!(
        out,
        "Final personal value: {}",
        format_currency(summary.final_personal_value, symbol)
    );
    let _ = writeln!(
        out,
        "Difference:           {}",
        signed_currency(summary.final_difference, symbol)
    );

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>4}  {:>14}  {:>14}  {:>14}  {:>14}  {:>8}  {:<20}",
        "Year", "Fund", "Pre-tax", "After-tax", "Difference", "Diff %", "Winner"
    );
    for row in &response.years {
        let marker = if row.is_breakeven { BREAKEVEN_MARKER } else { "" };
        let line = format!(
            "{:>4}  {:>14}  {:>14}  {:>14}  {:>14}  {:>8}  {:<20}  {}",
            row.year,
            format_currency(row.fund_value, symbol),
            format_currency(row.personal_value_pretax, symbol),
            format_currency(row.personal_value_aftertax, symbol),
            signed_currency(row.difference, symbol),
            format_percentage(row.difference_pct, 1),
            row.winner.label(),
            marker,
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let matrix = &response.sensitivity;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Break-even year by personal return (rows) and tax rate (columns), ceiling {}",
        matrix.ceiling_years
    );
    let mut header = format!("{:>8}", "");
    for tax in &matrix.tax_rates {
        let _ = write!(header, "  {:>6}", format_percentage(*tax, 0));
    }
    let _ = writeln!(out, "{header}");
    for (i, personal) in matrix.personal_returns.iter().enumerate() {
        let mut line = format!("{:>8}", format_percentage(*personal, 1));
        for j in 0..matrix.tax_rates.len() {
            let text = matrix
                .cell(i, j)
                .map(|cell| sensitivity_text(cell, matrix.ceiling_years))
                .unwrap_or_default();
            let _ = write!(line, "  {text:>6}");
        }
        let _ = writeln!(out, "{line}");
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>7}  {:>16}  {:>10}",
        "Horizon", "Required return", "Alpha"
    );
    for point in &response.required_returns {
        let alpha = point
            .alpha_required
            .map(|alpha| format_percentage(alpha, 2))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            out,
            "{:>7}  {:>16}  {:>10}",
            point.horizon_years,
            required_return_text(point.required_return),
            alpha
        );
    }

    out
}
