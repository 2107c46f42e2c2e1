//! Per-country unit price series.

use serde::Serialize;
use std::collections::HashSet;
use tde_comtrade::{period::PeriodToken, record::TradeRecord};

/// A single (period, unit price) pair used for line chart data points.
///
/// Records without a positive net weight keep their period with a price of
/// `0.0`; forecasting treats zero as "no usable price".
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesPoint {
    pub period: PeriodToken,
    pub unit_price: f64,
}

impl From<&TradeRecord> for SeriesPoint {
    fn from(record: &TradeRecord) -> Self {
        SeriesPoint {
            period: record.period.clone(),
            unit_price: record.unit_price().unwrap_or(0.0),
        }
    }
}

/// One country's unit price history: period-unique and period-ascending.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CountrySeries {
    pub country_code: String,
    pub country_name: String,
    pub points: Vec<SeriesPoint>,
}

impl CountrySeries {
    /// Build a series from raw fetched records (duplicates allowed, any order).
    pub fn from_records(
        country_code: impl Into<String>,
        country_name: impl Into<String>,
        records: &[TradeRecord],
    ) -> Self {
        CountrySeries {
            country_code: country_code.into(),
            country_name: country_name.into(),
            points: dedup_by_period(records.iter().map(SeriesPoint::from).collect(), |p| {
                &p.period
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Keep the first record seen for each period, then sort by period.
pub fn dedup_records(records: Vec<TradeRecord>) -> Vec<TradeRecord> {
    dedup_by_period(records, |r| &r.period)
}

fn dedup_by_period<T, F>(items: Vec<T>, period: F) -> Vec<T>
where
    F: Fn(&T) -> &PeriodToken,
{
    let mut seen: HashSet<PeriodToken> = HashSet::with_capacity(items.len());
    let mut kept: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(period(item).clone()))
        .collect();
    kept.sort_by(|a, b| period(a).cmp(period(b)));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(period: &str, value: f64, weight: f64) -> TradeRecord {
        TradeRecord {
            period: period.parse().unwrap(),
            reporter_description: "Australia".to_string(),
            partner_description: "China".to_string(),
            commodity_description: "Shrimps and prawns".to_string(),
            flow_description: "Export".to_string(),
            trade_value_usd: value,
            net_weight_kg: weight,
            quantity_unit: "kg".to_string(),
            period_description: String::new(),
        }
    }

    #[test]
    fn test_first_occurrence_wins_and_sorted() {
        let records = vec![
            record("2022-03", 300.0, 30.0),
            record("2022-01", 100.0, 10.0),
            record("2022-03", 999.0, 1.0),
            record("2022-02", 200.0, 40.0),
        ];
        let series = CountrySeries::from_records("36", "Australia", &records);
        let periods: Vec<&str> = series.points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, ["2022-01", "2022-02", "2022-03"]);
        let prices: Vec<f64> = series.points.iter().map(|p| p.unit_price).collect();
        assert_eq!(prices, [10.0, 5.0, 10.0]);
    }

    #[test]
    fn test_duplicate_record_yields_one_entry() {
        let r = record("2022-05", 50.0, 5.0);
        let deduped = dedup_records(vec![r.clone(), r.clone()]);
        assert_eq!(deduped, vec![r]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let records = vec![
            record("2021-12", 1.0, 1.0),
            record("2021-01", 2.0, 1.0),
            record("2021-12", 3.0, 1.0),
            record("2021-06", 4.0, 1.0),
        ];
        let once = dedup_records(records);
        let twice = dedup_records(once.clone());
        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[0].period <= w[1].period));
    }

    #[test]
    fn test_zero_weight_keeps_period_with_zero_price() {
        let records = vec![record("2022-01", 100.0, 0.0), record("2022-02", 100.0, 4.0)];
        let series = CountrySeries::from_records("36", "Australia", &records);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].unit_price, 0.0);
        assert_eq!(series.points[1].unit_price, 25.0);
    }

    #[test]
    fn test_empty_input() {
        let series = CountrySeries::from_records("36", "Australia", &[]);
        assert!(series.is_empty());
    }
}
