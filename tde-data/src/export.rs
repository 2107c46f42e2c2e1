//! Delimited text and spreadsheet rows for aggregated results.
//!
//! # Layouts
//!
//! - **Records** (flat, one row per country and period):
//!   `Period,Reporter,Partner,Commodity,Flow,Value (USD),Net Weight (kg),Unit Price (USD/kg),Quantity Unit`
//! - **Wide table**: `Period,<country 1>,<country 2>,...` with blank cells
//!   where a country has no data
//! - **Forecast**: `Period,Forecast,Lower,Upper`

use crate::{forecast::ForecastBand, wide::WideTable};
use csv::Writer;
use tde_comtrade::record::TradeRecord;

pub const RECORD_HEADER: [&str; 9] = [
    "Period",
    "Reporter",
    "Partner",
    "Commodity",
    "Flow",
    "Value (USD)",
    "Net Weight (kg)",
    "Unit Price (USD/kg)",
    "Quantity Unit",
];

pub const FORECAST_HEADER: [&str; 4] = ["Period", "Forecast", "Lower", "Upper"];

/// Header plus one row per record, ready for a spreadsheet writer.
pub fn record_rows(records: &[TradeRecord]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(RECORD_HEADER.iter().map(|s| s.to_string()).collect());
    for record in records {
        rows.push(vec![
            record.period.to_string(),
            record.reporter_description.clone(),
            record.partner_description.clone(),
            record.commodity_description.clone(),
            record.flow_description.clone(),
            record.trade_value_usd.to_string(),
            record.net_weight_kg.to_string(),
            record
                .unit_price()
                .map_or(String::new(), |price| format!("{price:.4}")),
            record.quantity_unit.clone(),
        ]);
    }
    rows
}

/// Header plus one row per period, one column per country.
pub fn wide_rows(table: &WideTable) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    let mut header = vec!["Period".to_string()];
    header.extend(table.countries.iter().cloned());
    rows.push(header);
    for row in &table.rows {
        let mut cells = vec![row.period.to_string()];
        cells.extend(table.countries.iter().map(|country| {
            row.columns
                .get(country)
                .map_or(String::new(), |value| format!("{value:.4}"))
        }));
        rows.push(cells);
    }
    rows
}

/// Header plus one row per forecast point.
pub fn forecast_rows(bands: &[ForecastBand]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(bands.len() + 1);
    rows.push(FORECAST_HEADER.iter().map(|s| s.to_string()).collect());
    for band in bands {
        rows.push(vec![
            band.period.clone(),
            format!("{:.4}", band.value),
            format!("{:.4}", band.lower),
            format!("{:.4}", band.upper),
        ]);
    }
    rows
}

/// Render rows as comma separated text.
pub fn rows_to_csv(rows: &[Vec<String>]) -> anyhow::Result<String> {
    let mut writer = Writer::from_writer(vec![]);
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

pub fn records_to_csv(records: &[TradeRecord]) -> anyhow::Result<String> {
    rows_to_csv(&record_rows(records))
}

pub fn wide_to_csv(table: &WideTable) -> anyhow::Result<String> {
    rows_to_csv(&wide_rows(table))
}

pub fn forecast_to_csv(bands: &[ForecastBand]) -> anyhow::Result<String> {
    rows_to_csv(&forecast_rows(bands))
}
