use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum, parser::ValueSource};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    DEFAULT_REQUIRED_RETURN_CURVE_YEARS, DEFAULT_REQUIRED_RETURN_HORIZONS,
    DEFAULT_SENSITIVITY_CEILING_YEARS, DEFAULT_SENSITIVITY_PERSONAL_RETURNS,
    DEFAULT_SENSITIVITY_TAX_RATES, InputParameters, MAX_BREAKEVEN_SEARCH_YEARS, Preset,
    PresetOverrides, RequiredReturnPoint, SensitivityConfig, SensitivityMatrix, Winner,
    YearlyOutcome, build_required_return_table, build_sensitivity_matrix, required_return_curve,
    run_comparison,
};
use crate::error::InputError;

mod report;

pub use report::{format_currency, format_percentage};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPreset {
    Conservative,
    Aggressive,
}

impl From<CliPreset> for Preset {
    fn from(value: CliPreset) -> Self {
        match value {
            CliPreset::Conservative => Preset::Conservative,
            CliPreset::Aggressive => Preset::Aggressive,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    preset: Option<Preset>,

    principal: Option<f64>,
    monthly_contribution: Option<f64>,

    fund_return: Option<f64>,
    management_fee: Option<f64>,
    fund_return_is_net: Option<bool>,

    personal_return: Option<f64>,
    cgt_rate: Option<f64>,
    tax_drag: Option<f64>,
    include_tax_drag: Option<bool>,

    horizon_years: Option<u32>,
    lockup_years: Option<u32>,

    sensitivity_ceiling: Option<u32>,
    sensitivity_returns: Option<Vec<f64>>,
    sensitivity_tax_rates: Option<Vec<f64>>,
    required_return_horizons: Option<Vec<u32>>,
    curve_years: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "lockup",
    about = "Locked tax-advantaged fund vs withdrawing at lockup and investing personally"
)]
struct Cli {
    #[arg(
        long,
        value_enum,
        help = "Scenario preset; explicit flags still take precedence"
    )]
    preset: Option<CliPreset>,
    #[arg(long, default_value_t = 0.0, help = "Initial lump sum")]
    principal: f64,
    #[arg(long, default_value_t = 1571.0)]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Expected annual fund return in percent, e.g. 8"
    )]
    fund_return: f64,
    #[arg(
        long,
        default_value_t = 0.35,
        help = "Annual fund management fee in percent"
    )]
    management_fee: f64,
    #[arg(long, help = "The fund return is already net of the management fee")]
    fund_return_is_net: bool,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Expected annual personal investment return in percent"
    )]
    personal_return: f64,
    #[arg(
        long,
        default_value_t = 25.0,
        help = "Capital gains tax rate on personal gains in percent"
    )]
    capital_gains_tax_rate: f64,
    #[arg(
        long,
        default_value_t = 0.3,
        help = "Annual tax drag on personal returns in percent, used with --include-tax-drag"
    )]
    tax_drag: f64,
    #[arg(long)]
    include_tax_drag: bool,
    #[arg(long, default_value_t = 20)]
    horizon_years: u32,
    #[arg(
        long,
        default_value_t = 10,
        help = "Years before the fund can be withdrawn"
    )]
    lockup_years: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_SENSITIVITY_CEILING_YEARS,
        help = "Last year the sensitivity grid searches for a break-even"
    )]
    sensitivity_ceiling: u32,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Personal returns in percent for the sensitivity grid rows"
    )]
    sensitivity_returns: Vec<f64>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Tax rates in percent for the sensitivity grid columns"
    )]
    sensitivity_tax_rates: Vec<f64>,
    #[arg(long, value_delimiter = ',')]
    required_return_horizons: Vec<u32>,
    #[arg(long, default_value_t = DEFAULT_REQUIRED_RETURN_CURVE_YEARS)]
    curve_years: u32,
    #[arg(long, help = "Print a text report instead of JSON")]
    table: bool,
    #[arg(long, default_value = "₪")]
    currency_symbol: String,
}

#[derive(Debug, Clone, PartialEq)]
struct AnalysisOptions {
    sensitivity_ceiling: u32,
    sensitivity_returns: Vec<f64>,
    sensitivity_tax_rates: Vec<f64>,
    required_return_horizons: Vec<u32>,
    curve_years: u32,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: InputParameters,
    options: AnalysisOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    winner: Winner,
    winner_label: &'static str,
    breakeven_year: Option<u32>,
    breakeven_label: String,
    fund_net_return: f64,
    personal_effective_return: f64,
    final_fund_value: f64,
    final_personal_value: f64,
    final_difference: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct YearRow {
    year: u32,
    fund_value: f64,
    personal_value_pretax: f64,
    personal_value_aftertax: f64,
    difference: f64,
    difference_pct: f64,
    winner: Winner,
    is_breakeven: bool,
}

impl YearRow {
    fn from_outcome(outcome: &YearlyOutcome, breakeven_year: Option<u32>) -> Self {
        Self {
            year: outcome.year,
            fund_value: outcome.fund_value,
            personal_value_pretax: outcome.personal_value_pretax,
            personal_value_aftertax: outcome.personal_value_aftertax,
            difference: outcome.difference(),
            difference_pct: outcome.difference_pct(),
            winner: if outcome.fund_wins {
                Winner::Fund
            } else {
                Winner::Personal
            },
            is_breakeven: breakeven_year == Some(outcome.year),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    inputs: InputParameters,
    summary: SummaryResponse,
    years: Vec<YearRow>,
    sensitivity: SensitivityMatrix,
    required_returns: Vec<RequiredReturnPoint>,
    required_return_curve: Vec<RequiredReturnPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetResponse {
    name: Preset,
    overrides: PresetOverrides,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn percent_to_fraction(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v / 100.0).collect()
}

/// Preset values for every field the caller did not set explicitly.
fn preset_overrides(preset: Option<Preset>, explicit: impl Fn(&str) -> bool) -> PresetOverrides {
    let Some(preset) = preset else {
        return PresetOverrides::default();
    };
    let overrides = preset.overrides();
    PresetOverrides {
        fund_gross_return: overrides
            .fund_gross_return
            .filter(|_| !explicit("fund_return")),
        personal_return: overrides
            .personal_return
            .filter(|_| !explicit("personal_return")),
        horizon_years: overrides
            .horizon_years
            .filter(|_| !explicit("horizon_years")),
    }
}

fn build_inputs(cli: &Cli, overrides: PresetOverrides) -> Result<InputParameters, InputError> {
    let inputs = overrides.apply(InputParameters {
        principal: cli.principal,
        monthly_contribution: cli.monthly_contribution,
        fund_gross_return: cli.fund_return / 100.0,
        fund_management_fee: cli.management_fee / 100.0,
        fund_return_is_net: cli.fund_return_is_net,
        personal_return: cli.personal_return / 100.0,
        capital_gains_tax_rate: cli.capital_gains_tax_rate / 100.0,
        annual_tax_drag: cli.tax_drag / 100.0,
        include_tax_drag: cli.include_tax_drag,
        horizon_years: cli.horizon_years,
        lockup_years: cli.lockup_years,
    });

    validate_inputs(&inputs)?;
    Ok(inputs)
}

fn validate_inputs(inputs: &InputParameters) -> Result<(), InputError> {
    if !inputs.principal.is_finite() || inputs.principal < 0.0 {
        return Err(InputError::out_of_range("--principal", ">= 0"));
    }

    if !inputs.monthly_contribution.is_finite() || inputs.monthly_contribution < 0.0 {
        return Err(InputError::out_of_range("--monthly-contribution", ">= 0"));
    }

    if !inputs.fund_gross_return.is_finite() || inputs.fund_gross_return <= -1.0 {
        return Err(InputError::out_of_range("--fund-return", "> -100"));
    }

    if !(0.0..1.0).contains(&inputs.fund_management_fee) {
        return Err(InputError::out_of_range(
            "--management-fee",
            "between 0 and 100 (exclusive)",
        ));
    }

    if !inputs.personal_return.is_finite() || inputs.personal_return <= -1.0 {
        return Err(InputError::out_of_range("--personal-return", "> -100"));
    }

    if !(0.0..1.0).contains(&inputs.capital_gains_tax_rate) {
        return Err(InputError::out_of_range(
            "--capital-gains-tax-rate",
            "between 0 and 100 (exclusive)",
        ));
    }

    if !(0.0..=1.0).contains(&inputs.annual_tax_drag) {
        return Err(InputError::out_of_range("--tax-drag", "between 0 and 100"));
    }

    if inputs.include_tax_drag && inputs.personal_effective_return() <= -1.0 {
        return Err(InputError::out_of_range(
            "--tax-drag",
            "smaller than the personal return plus 100",
        ));
    }

    if !(1..=MAX_BREAKEVEN_SEARCH_YEARS).contains(&inputs.horizon_years) {
        return Err(InputError::out_of_range(
            "--horizon-years",
            "between 1 and 100",
        ));
    }

    if inputs.lockup_years == 0 {
        return Err(InputError::out_of_range("--lockup-years", ">= 1"));
    }

    Ok(())
}

fn build_options(cli: &Cli) -> Result<AnalysisOptions, InputError> {
    if !(1..=MAX_BREAKEVEN_SEARCH_YEARS).contains(&cli.sensitivity_ceiling) {
        return Err(InputError::out_of_range(
            "--sensitivity-ceiling",
            "between 1 and 100",
        ));
    }

    if !(1..=MAX_BREAKEVEN_SEARCH_YEARS).contains(&cli.curve_years) {
        return Err(InputError::out_of_range("--curve-years", "between 1 and 100"));
    }

    if cli
        .sensitivity_returns
        .iter()
        .any(|rate| !rate.is_finite() || *rate <= -100.0)
    {
        return Err(InputError::out_of_range(
            "--sensitivity-returns",
            "a list of rates > -100",
        ));
    }

    if cli
        .sensitivity_tax_rates
        .iter()
        .any(|rate| !(0.0..100.0).contains(rate))
    {
        return Err(InputError::out_of_range(
            "--sensitivity-tax-rates",
            "a list of rates between 0 and 100 (exclusive)",
        ));
    }

    if cli
        .required_return_horizons
        .iter()
        .any(|years| !(1..=MAX_BREAKEVEN_SEARCH_YEARS).contains(years))
    {
        return Err(InputError::out_of_range(
            "--required-return-horizons",
            "a list of years between 1 and 100",
        ));
    }

    Ok(AnalysisOptions {
        sensitivity_ceiling: cli.sensitivity_ceiling,
        sensitivity_returns: if cli.sensitivity_returns.is_empty() {
            DEFAULT_SENSITIVITY_PERSONAL_RETURNS.to_vec()
        } else {
            percent_to_fraction(&cli.sensitivity_returns)
        },
        sensitivity_tax_rates: if cli.sensitivity_tax_rates.is_empty() {
            DEFAULT_SENSITIVITY_TAX_RATES.to_vec()
        } else {
            percent_to_fraction(&cli.sensitivity_tax_rates)
        },
        required_return_horizons: if cli.required_return_horizons.is_empty() {
            DEFAULT_REQUIRED_RETURN_HORIZONS.to_vec()
        } else {
            cli.required_return_horizons.clone()
        },
        curve_years: cli.curve_years,
    })
}

fn api_request_from_cli(
    cli: &Cli,
    explicit: impl Fn(&str) -> bool,
) -> Result<ApiRequest, InputError> {
    let overrides = preset_overrides(cli.preset.map(Preset::from), explicit);
    Ok(ApiRequest {
        inputs: build_inputs(cli, overrides)?,
        options: build_options(cli)?,
    })
}

pub fn run_cli<I, T>(args: I) -> Result<(), InputError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = Cli::command().get_matches_from(args);
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let explicit = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);

    let request = api_request_from_cli(&cli, explicit)?;
    let response = build_compare_response(&request);

    if cli.table {
        print!("{}", report::render_report(&response, &cli.currency_symbol));
    } else {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route("/api/presets", get(presets_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("lockup HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/compare");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn presets_handler() -> Response {
    let presets: Vec<PresetResponse> = Preset::ALL
        .iter()
        .map(|&name| PresetResponse {
            name,
            overrides: name.overrides(),
        })
        .collect();
    json_response(StatusCode::OK, presets)
}

async fn compare_get_handler(Query(payload): Query<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_handler_impl(payload: ComparePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(e) => {
            warn!("rejected compare request: {e}");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let response = build_compare_response(&request);
    debug!(
        horizon = request.inputs.horizon_years,
        breakeven_year = ?response.summary.breakeven_year,
        "compare request served"
    );
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: message.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, InputError> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| InputError::InvalidPayload(e.to_string()))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ComparePayload) -> Result<ApiRequest, InputError> {
    let mut cli = default_cli_for_api();

    let explicit = |id: &str| match id {
        "fund_return" => payload.fund_return.is_some(),
        "personal_return" => payload.personal_return.is_some(),
        "horizon_years" => payload.horizon_years.is_some(),
        _ => false,
    };
    let overrides = preset_overrides(payload.preset, explicit);

    if let Some(v) = payload.principal {
        cli.principal = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }

    if let Some(v) = payload.fund_return {
        cli.fund_return = v;
    }
    if let Some(v) = payload.management_fee {
        cli.management_fee = v;
    }
    if let Some(v) = payload.fund_return_is_net {
        cli.fund_return_is_net = v;
    }

    if let Some(v) = payload.personal_return {
        cli.personal_return = v;
    }
    if let Some(v) = payload.cgt_rate {
        cli.capital_gains_tax_rate = v;
    }
    if let Some(v) = payload.tax_drag {
        cli.tax_drag = v;
    }
    if let Some(v) = payload.include_tax_drag {
        cli.include_tax_drag = v;
    }

    if let Some(v) = payload.horizon_years {
        cli.horizon_years = v;
    }
    if let Some(v) = payload.lockup_years {
        cli.lockup_years = v;
    }

    if let Some(v) = payload.sensitivity_ceiling {
        cli.sensitivity_ceiling = v;
    }
    if let Some(v) = payload.sensitivity_returns {
        cli.sensitivity_returns = v;
    }
    if let Some(v) = payload.sensitivity_tax_rates {
        cli.sensitivity_tax_rates = v;
    }
    if let Some(v) = payload.required_return_horizons {
        cli.required_return_horizons = v;
    }
    if let Some(v) = payload.curve_years {
        cli.curve_years = v;
    }

    Ok(ApiRequest {
        inputs: build_inputs(&cli, overrides)?,
        options: build_options(&cli)?,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        preset: None,
        principal: 0.0,
        monthly_contribution: 1_571.0,
        fund_return: 8.0,
        management_fee: 0.35,
        fund_return_is_net: false,
        personal_return: 10.0,
        capital_gains_tax_rate: 25.0,
        tax_drag: 0.3,
        include_tax_drag: false,
        horizon_years: 20,
        lockup_years: 10,
        sensitivity_ceiling: DEFAULT_SENSITIVITY_CEILING_YEARS,
        sensitivity_returns: Vec::new(),
        sensitivity_tax_rates: Vec::new(),
        required_return_horizons: Vec::new(),
        curve_years: DEFAULT_REQUIRED_RETURN_CURVE_YEARS,
        table: false,
        currency_symbol: "₪".to_string(),
    }
}

fn build_compare_response(request: &ApiRequest) -> CompareResponse {
    let inputs = &request.inputs;
    let options = &request.options;
    let outcome = run_comparison(inputs);

    let sensitivity = build_sensitivity_matrix(
        SensitivityConfig::from_inputs(inputs, options.sensitivity_ceiling),
        &options.sensitivity_returns,
        &options.sensitivity_tax_rates,
    );
    let required_returns = build_required_return_table(
        outcome.fund_net_return,
        inputs.capital_gains_tax_rate,
        &options.required_return_horizons,
    );
    let curve = required_return_curve(
        outcome.fund_net_return,
        inputs.capital_gains_tax_rate,
        options.curve_years,
    );

    let winner = outcome.winner();
    CompareResponse {
        inputs: *inputs,
        summary: SummaryResponse {
            winner,
            winner_label: winner.label(),
            breakeven_year: outcome.breakeven_year,
            breakeven_label: report::breakeven_label(outcome.breakeven_year),
            fund_net_return: outcome.fund_net_return,
            personal_effective_return: outcome.personal_effective_return,
            final_fund_value: outcome.final_fund_value(),
            final_personal_value: outcome.final_personal_value(),
            final_difference: outcome.final_difference(),
        },
        years: outcome
            .yearly
            .iter()
            .map(|year| YearRow::from_outcome(year, outcome.breakeven_year))
            .collect(),
        sensitivity,
        required_returns,
        required_return_curve: curve,
    }
}
