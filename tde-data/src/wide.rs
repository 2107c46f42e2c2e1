//! Period-indexed table with one sparse column per country.
//!
//! Rows exist only for periods at least one country has data for, and a
//! country's column is present in a row only when that country reported the
//! period. A missing column means "no data", never zero.

use crate::series::CountrySeries;
use serde::Serialize;
use std::collections::BTreeMap;
use tde_comtrade::period::PeriodToken;

/// Key the period takes in a flattened row; no country column may use it.
pub const PERIOD_KEY: &str = "period";

/// Column name for a series: its display name, unless that collides with
/// [`PERIOD_KEY`], in which case the country code is appended.
pub fn column_name(series: &CountrySeries) -> String {
    if series.country_name == PERIOD_KEY {
        format!("{} ({})", series.country_name, series.country_code)
    } else {
        series.country_name.clone()
    }
}

/// One period of the wide table.
///
/// Serializes flat (`{"period": "2022-01", "Australia": 10.0}`) so chart
/// code can read it directly.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WideRow {
    pub period: PeriodToken,
    #[serde(flatten)]
    pub columns: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WideTable {
    /// Column names in the order their series were supplied
    #[serde(skip)]
    pub countries: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Merge country series into one table keyed by period.
    pub fn from_series(series: &[CountrySeries]) -> WideTable {
        let mut by_period: BTreeMap<PeriodToken, WideRow> = BTreeMap::new();
        let mut countries: Vec<String> = Vec::with_capacity(series.len());
        for country in series {
            let name = column_name(country);
            if !countries.contains(&name) {
                countries.push(name.clone());
            }
            for point in &country.points {
                by_period
                    .entry(point.period.clone())
                    .or_insert_with(|| WideRow {
                        period: point.period.clone(),
                        columns: BTreeMap::new(),
                    })
                    .columns
                    .insert(name.clone(), point.unit_price);
            }
        }
        WideTable {
            countries,
            rows: by_period.into_values().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Period of the final row.
    pub fn last_period(&self) -> Option<&PeriodToken> {
        self.rows.last().map(|row| &row.period)
    }

    /// A country's values in period order, skipping rows where it is absent.
    pub fn column<'a>(&'a self, country: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.columns.get(country).copied())
    }

    /// A country's strictly positive values in period order.
    pub fn positive_column(&self, country: &str) -> Vec<f64> {
        self.column(country).filter(|value| *value > 0.0).collect()
    }

    /// Serialize rows as a JSON array for chart consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rows)
    }
}
