//! Forecast payload assembly and response post-processing.
//!
//! The reporter's own unit price series becomes the dependent input `X1`;
//! up to four further countries fill `X2`..`X5` in selection order. Only
//! strictly positive prices are used, and an additional country without any
//! usable price gives up its slot to the next one.

use crate::wide::WideTable;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use tde_comtrade::{
    error::ComtradeError,
    forecast::{ForecastPoint, ForecastRequest, ForecastService},
};
use tde_utils::periods::dashed_period;
use thiserror::Error;

/// Fewest dependent values the model accepts.
pub const MIN_HISTORY: usize = 3;

/// Exogenous slots available after `X1`.
pub const MAX_EXOGENOUS: usize = 4;

/// Relative half-width of the display band around each forecast value.
pub const BAND_WIDTH: f64 = 0.15;

/// Selector value meaning "no country chosen".
pub const NO_SELECTION: &str = "none";

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("A reporter country must be selected")]
    MissingReporter,

    #[error("A partner country must be selected")]
    MissingPartner,

    #[error("Forecast horizon must be a positive whole number, got {0:?}")]
    InvalidHorizon(String),

    #[error("Too many additional countries (max: {max}, selected: {found})")]
    TooManyExogenous { max: usize, found: usize },

    #[error("Insufficient history to forecast (needed: {needed}, found: {found})")]
    InsufficientHistory { needed: usize, found: usize },

    #[error("Forecast service failed: {0}")]
    Service(#[from] ComtradeError),
}

/// What the user picked for a forecast, validated as a whole on submit.
///
/// Countries are wide-table column names. Unselected additional slots may be
/// `None`, empty, or `"none"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSelection {
    pub reporter: Option<String>,
    pub partner: Option<String>,
    pub additional: Vec<Option<String>>,
    pub horizon: String,
}

impl ForecastSelection {
    /// Check everything that does not depend on fetched data and return the
    /// parsed horizon. Callers run this before any request is made.
    pub fn validate_inputs(&self) -> Result<u32, ForecastError> {
        selected(&self.reporter).ok_or(ForecastError::MissingReporter)?;
        selected(&self.partner).ok_or(ForecastError::MissingPartner)?;
        let horizon = parse_horizon(&self.horizon)?;
        if self.additional.len() > MAX_EXOGENOUS {
            return Err(ForecastError::TooManyExogenous {
                max: MAX_EXOGENOUS,
                found: self.additional.len(),
            });
        }
        Ok(horizon)
    }
}

fn selected(choice: &Option<String>) -> Option<&str> {
    choice
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(NO_SELECTION))
}

fn parse_horizon(raw: &str) -> Result<u32, ForecastError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|horizon| *horizon > 0)
        .ok_or_else(|| ForecastError::InvalidHorizon(raw.to_string()))
}

/// Service-facing form of the last period: compact `YYYYMM` becomes `YYYY-MM`.
pub fn last_known_period(table: &WideTable) -> String {
    table
        .last_period()
        .map(|period| dashed_period(period.as_str()))
        .unwrap_or_default()
}

/// Build the request body for the forecasting service.
pub fn build_forecast_request(
    table: &WideTable,
    selection: &ForecastSelection,
) -> Result<ForecastRequest, ForecastError> {
    let horizon = selection.validate_inputs()?;
    let reporter = selected(&selection.reporter).ok_or(ForecastError::MissingReporter)?;

    let dependent = table.positive_column(reporter);
    if dependent.len() < MIN_HISTORY {
        return Err(ForecastError::InsufficientHistory {
            needed: MIN_HISTORY,
            found: dependent.len(),
        });
    }

    let mut inputs = BTreeMap::new();
    inputs.insert("X1".to_string(), dependent);
    let exogenous = selection
        .additional
        .iter()
        .filter_map(selected)
        .map(|country| table.positive_column(country))
        .filter(|values| !values.is_empty());
    for (slot, values) in (2..).zip(exogenous) {
        inputs.insert(format!("X{slot}"), values);
    }

    Ok(ForecastRequest {
        inputs,
        horizon,
        last_known_period: last_known_period(table),
    })
}

/// A forecast point with its display band.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastBand {
    pub period: String,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Clamp service values to zero or above and derive the ±15% band.
pub fn to_bands(points: &[ForecastPoint]) -> Vec<ForecastBand> {
    points
        .iter()
        .map(|point| {
            let value = point.value.max(0.0);
            ForecastBand {
                period: point.period.clone(),
                value,
                lower: value * (1.0 - BAND_WIDTH),
                upper: value * (1.0 + BAND_WIDTH),
            }
        })
        .collect()
}

/// Validate, build the payload, call the service once, and band the result.
///
/// Every validation failure happens before the service is contacted.
pub async fn run_forecast<F: ForecastService + ?Sized>(
    service: &F,
    table: &WideTable,
    selection: &ForecastSelection,
) -> Result<Vec<ForecastBand>, ForecastError> {
    let request = build_forecast_request(table, selection)?;
    info!(
        "Forecast payload: {} inputs, X1 has {} values, last period {}",
        request.inputs.len(),
        request.inputs.get("X1").map_or(0, Vec::len),
        request.last_known_period
    );
    let points = service.forecast(&request).await?;
    Ok(to_bands(&points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{CountrySeries, SeriesPoint};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tde_comtrade::error::Result as ComtradeResult;

    fn series(name: &str, prices: &[f64]) -> CountrySeries {
        CountrySeries {
            country_code: name.to_lowercase(),
            country_name: name.to_string(),
            points: prices
                .iter()
                .enumerate()
                .map(|(i, price)| SeriesPoint {
                    period: format!("2022-{:02}", i + 1).parse().unwrap(),
                    unit_price: *price,
                })
                .collect(),
        }
    }

    fn selection(reporter: &str, additional: &[Option<&str>], horizon: &str) -> ForecastSelection {
        ForecastSelection {
            reporter: Some(reporter.to_string()),
            partner: Some("China".to_string()),
            additional: additional.iter().map(|c| c.map(str::to_string)).collect(),
            horizon: horizon.to_string(),
        }
    }

    struct CountingService {
        calls: AtomicUsize,
        response: Vec<ForecastPoint>,
    }

    #[async_trait]
    impl ForecastService for CountingService {
        async fn forecast(&self, _request: &ForecastRequest) -> ComtradeResult<Vec<ForecastPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    #[test]
    fn test_slot_assignment_skips_empty_and_unselected() {
        let table = WideTable::from_series(&[
            series("A", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            series("B", &[0.0, 0.0]),
            series("C", &[6.0, 7.0, 8.0]),
            series("D", &[9.0, 10.0, 11.0, 12.0]),
        ]);
        let request = build_forecast_request(
            &table,
            &selection("A", &[Some("B"), Some("C"), Some("none"), Some("D")], "6"),
        )
        .unwrap();
        let keys: Vec<&str> = request.inputs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["X1", "X2", "X3"]);
        assert_eq!(request.inputs["X1"], [1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(request.inputs["X2"], [6.0, 7.0, 8.0]);
        assert_eq!(request.inputs["X3"], [9.0, 10.0, 11.0, 12.0]);
        assert_eq!(request.horizon, 6);
        assert_eq!(request.last_known_period, "2022-05");
    }

    #[test]
    fn test_short_reporter_series_rejected() {
        let table = WideTable::from_series(&[series("A", &[1.0, 2.0])]);
        let err = build_forecast_request(&table, &selection("A", &[], "3")).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientHistory { found: 2, .. }));
    }

    #[test]
    fn test_zero_prices_do_not_count_as_history() {
        let table = WideTable::from_series(&[series("A", &[1.0, 0.0, 2.0, 0.0])]);
        let err = build_forecast_request(&table, &selection("A", &[], "3")).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientHistory { found: 2, .. }));
    }

    #[test]
    fn test_selection_validation() {
        let table = WideTable::from_series(&[series("A", &[1.0, 2.0, 3.0])]);
        let mut missing_reporter = selection("A", &[], "3");
        missing_reporter.reporter = Some(NO_SELECTION.to_string());
        assert!(matches!(
            build_forecast_request(&table, &missing_reporter),
            Err(ForecastError::MissingReporter)
        ));

        let mut missing_partner = selection("A", &[], "3");
        missing_partner.partner = None;
        assert!(matches!(
            build_forecast_request(&table, &missing_partner),
            Err(ForecastError::MissingPartner)
        ));

        for horizon in ["0", "-2", "six", ""] {
            assert!(matches!(
                build_forecast_request(&table, &selection("A", &[], horizon)),
                Err(ForecastError::InvalidHorizon(_))
            ));
        }

        let five = [Some("B"), Some("C"), Some("D"), Some("E"), Some("F")];
        assert!(matches!(
            build_forecast_request(&table, &selection("A", &five, "3")),
            Err(ForecastError::TooManyExogenous { found: 5, .. })
        ));
    }

    #[test]
    fn test_validate_inputs_needs_no_table() {
        assert_eq!(selection("36", &[Some("554")], " 12 ").validate_inputs().unwrap(), 12);
        assert!(matches!(
            selection("36", &[], "abc").validate_inputs(),
            Err(ForecastError::InvalidHorizon(_))
        ));
        let five = [Some("1"), Some("2"), Some("3"), Some("4"), Some("5")];
        assert!(matches!(
            selection("36", &five, "6").validate_inputs(),
            Err(ForecastError::TooManyExogenous { max: 4, found: 5 })
        ));
    }

    #[test]
    fn test_last_known_period() {
        let mut table = WideTable::from_series(&[series("A", &[1.0])]);
        assert_eq!(last_known_period(&table), "2022-01");
        table.rows.clear();
        assert_eq!(last_known_period(&table), "");
    }

    #[test]
    fn test_bands_clamp_negative_values() {
        let bands = to_bands(&[
            ForecastPoint {
                period: "2023-01".to_string(),
                value: 100.0,
            },
            ForecastPoint {
                period: "2023-02".to_string(),
                value: -4.0,
            },
        ]);
        assert!((bands[0].lower - 85.0).abs() < 1e-9);
        assert!((bands[0].upper - 115.0).abs() < 1e-9);
        assert_eq!(bands[1].value, 0.0);
        assert_eq!(bands[1].upper, 0.0);
    }

    #[tokio::test]
    async fn test_rejection_never_calls_service() {
        let service = CountingService {
            calls: AtomicUsize::new(0),
            response: Vec::new(),
        };
        let table = WideTable::from_series(&[series("A", &[1.0, 2.0])]);
        let result = run_forecast(&service, &table, &selection("A", &[], "3")).await;
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientHistory { found: 2, .. })
        ));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_forecast_calls_once() {
        let service = CountingService {
            calls: AtomicUsize::new(0),
            response: vec![ForecastPoint {
                period: "2022-04".to_string(),
                value: 20.0,
            }],
        };
        let table = WideTable::from_series(&[series("A", &[1.0, 2.0, 3.0])]);
        let bands = run_forecast(&service, &table, &selection("A", &[None], "1"))
            .await
            .unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].value, 20.0);
    }
}
