//! Forecast command: aggregate, build the payload, call the model server.

use crate::{check_additional, config::Config, query::fetch_aggregation, write_output, QueryArgs};
use anyhow::Context;
use log::info;
use tde_comtrade::forecast::ForecastClient;
use tde_data::{
    export::forecast_to_csv,
    forecast::{run_forecast as forecast_bands, ForecastSelection},
    series::CountrySeries,
    wide::column_name,
};

/// Wide-table column for a reporter code. A country that returned nothing
/// has no column; its code is used so the history check reports zero points.
fn column_for(series: &[CountrySeries], code: &str) -> String {
    series
        .iter()
        .find(|s| s.country_code == code.trim())
        .map(column_name)
        .unwrap_or_else(|| code.trim().to_string())
}

fn selection_for(
    series: &[CountrySeries],
    query: &QueryArgs,
    with: &[String],
    horizon: &str,
) -> ForecastSelection {
    ForecastSelection {
        reporter: Some(column_for(series, &query.reporter)),
        partner: Some(query.partner.clone()),
        additional: with.iter().map(|code| Some(column_for(series, code))).collect(),
        horizon: horizon.to_string(),
    }
}

pub async fn run_forecast(
    config: &Config,
    query: &QueryArgs,
    with: &[String],
    horizon: &str,
    output: Option<&str>,
) -> anyhow::Result<()> {
    check_additional(with)?;
    // Codes stand in for column names until the data is fetched.
    selection_for(&[], query, with, horizon).validate_inputs()?;
    query.to_spec()?;

    let forecast_url = config.require_forecast_url()?;
    let service = ForecastClient::new(forecast_url).context("Failed to build the forecast client")?;

    let aggregation = fetch_aggregation(config, query, with).await?;
    let selection = selection_for(&aggregation.series, query, with, horizon);
    let bands = forecast_bands(&service, &aggregation.table, &selection)
        .await
        .context("Forecast failed")?;
    info!("Forecast returned {} points", bands.len());
    write_output(output, &forecast_to_csv(&bands)?)
}
