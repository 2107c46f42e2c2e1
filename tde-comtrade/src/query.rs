use crate::{
    chunk::split_chunks,
    error::{ComtradeError, Result},
    period::{join_periods, Frequency, PeriodSelection, PeriodToken},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Partner code Comtrade uses for "World".
pub const WORLD_PARTNER_CODE: &str = "0";

/// Direction of a trade flow.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    Import,
    Export,
}

impl FlowDirection {
    /// Comtrade `flowCode` value.
    pub fn code(&self) -> &'static str {
        match self {
            FlowDirection::Import => "M",
            FlowDirection::Export => "X",
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Accepts the current `M`/`X` codes, the legacy numeric `1`/`2`, and the
/// plain words.
impl FromStr for FlowDirection {
    type Err = ComtradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "1" | "import" => Ok(FlowDirection::Import),
            "x" | "2" | "export" => Ok(FlowDirection::Export),
            other => Err(ComtradeError::InvalidQuery(format!(
                "unknown flow direction: {other}"
            ))),
        }
    }
}

/// A fully specified trade query. Built once per fetch and never mutated;
/// use [`QuerySpec::for_reporter`] to derive the query for another country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub reporter_code: String,
    pub partner_code: String,
    pub commodity_code: String,
    pub flow: FlowDirection,
    pub frequency: Frequency,
    pub periods: Vec<PeriodToken>,
}

impl QuerySpec {
    /// Validate a selection and expand its period range.
    ///
    /// An empty partner defaults to World. A range whose end precedes its
    /// start expands to nothing and is rejected here.
    pub fn new(
        reporter_code: &str,
        partner_code: &str,
        commodity_code: &str,
        flow: FlowDirection,
        selection: &PeriodSelection,
    ) -> Result<Self> {
        let reporter_code = reporter_code.trim();
        if reporter_code.is_empty() {
            return Err(ComtradeError::InvalidQuery(
                "a reporter country is required".to_string(),
            ));
        }
        let commodity_code = commodity_code.trim();
        if commodity_code.is_empty() {
            return Err(ComtradeError::InvalidQuery(
                "a commodity code is required".to_string(),
            ));
        }
        let partner_code = match partner_code.trim() {
            "" => WORLD_PARTNER_CODE,
            code => code,
        };
        let periods = selection.expand();
        if periods.is_empty() {
            return Err(ComtradeError::InvalidQuery(
                "period range is empty: the end precedes the start".to_string(),
            ));
        }
        Ok(QuerySpec {
            reporter_code: reporter_code.to_string(),
            partner_code: partner_code.to_string(),
            commodity_code: commodity_code.to_string(),
            flow,
            frequency: selection.frequency(),
            periods,
        })
    }

    /// The same query for a different reporter.
    pub fn for_reporter(&self, reporter_code: &str) -> QuerySpec {
        QuerySpec {
            reporter_code: reporter_code.trim().to_string(),
            ..self.clone()
        }
    }

    pub fn period_start(&self) -> Option<&PeriodToken> {
        self.periods.first()
    }

    pub fn period_end(&self) -> Option<&PeriodToken> {
        self.periods.last()
    }

    /// One request per batch of at most `limit` periods, in period order.
    pub fn chunks(&self, limit: usize) -> Result<Vec<ChunkRequest<'_>>> {
        let batches = split_chunks(&self.periods, limit)?;
        Ok(batches
            .into_iter()
            .enumerate()
            .map(|(index, periods)| ChunkRequest {
                spec: self,
                index,
                periods,
            })
            .collect())
    }
}

/// One page of a query: the query plus a single batch of periods.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRequest<'a> {
    pub spec: &'a QuerySpec,
    pub index: usize,
    pub periods: Vec<PeriodToken>,
}

impl ChunkRequest<'_> {
    /// Comma separated `period` parameter.
    pub fn period_param(&self) -> String {
        join_periods(&self.periods)
    }

    /// Query string pairs for the Comtrade data endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("reporterCode", self.spec.reporter_code.clone()),
            ("partnerCode", self.spec.partner_code.clone()),
            ("cmdCode", self.spec.commodity_code.clone()),
            ("flowCode", self.spec.flow.code().to_string()),
            ("period", self.period_param()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tde_utils::periods::YearMonth;

    fn monthly(start: (i32, u32), end: (i32, u32)) -> PeriodSelection {
        PeriodSelection::Monthly {
            start: YearMonth::new(start.0, start.1).unwrap(),
            end: YearMonth::new(end.0, end.1).unwrap(),
        }
    }

    #[test]
    fn test_new_expands_periods() {
        let spec = QuerySpec::new(
            "36",
            "156",
            "030631",
            FlowDirection::Export,
            &monthly((2022, 1), (2022, 3)),
        )
        .unwrap();
        assert_eq!(spec.frequency, Frequency::Monthly);
        assert_eq!(spec.periods.len(), 3);
        assert_eq!(spec.period_start().unwrap().as_str(), "2022-01");
        assert_eq!(spec.period_end().unwrap().as_str(), "2022-03");
    }

    #[test]
    fn test_empty_partner_is_world() {
        let spec = QuerySpec::new(
            "36",
            " ",
            "0306",
            FlowDirection::Import,
            &PeriodSelection::Annual {
                start: 2020,
                end: 2020,
            },
        )
        .unwrap();
        assert_eq!(spec.partner_code, WORLD_PARTNER_CODE);
    }

    #[test]
    fn test_missing_reporter_rejected() {
        let result = QuerySpec::new(
            "",
            "156",
            "0306",
            FlowDirection::Import,
            &monthly((2022, 1), (2022, 3)),
        );
        assert!(matches!(result, Err(ComtradeError::InvalidQuery(_))));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let result = QuerySpec::new(
            "36",
            "156",
            "0306",
            FlowDirection::Import,
            &monthly((2022, 3), (2022, 1)),
        );
        assert!(matches!(result, Err(ComtradeError::InvalidQuery(_))));
    }

    #[test]
    fn test_chunk_requests() {
        let spec = QuerySpec::new(
            "36",
            "156",
            "030631",
            FlowDirection::Export,
            &monthly((2021, 1), (2022, 6)),
        )
        .unwrap();
        let chunks = spec.chunks(12).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].periods.len(), 6);
        let pairs = chunks[1].query_pairs();
        assert_eq!(pairs[3], ("flowCode", "X".to_string()));
        assert_eq!(
            pairs[4],
            ("period", "202201,202202,202203,202204,202205,202206".to_string())
        );
    }

    #[test]
    fn test_for_reporter_keeps_everything_else() {
        let spec = QuerySpec::new(
            "36",
            "156",
            "030631",
            FlowDirection::Export,
            &monthly((2022, 1), (2022, 2)),
        )
        .unwrap();
        let other = spec.for_reporter("554");
        assert_eq!(other.reporter_code, "554");
        assert_eq!(other.periods, spec.periods);
        assert_eq!(spec.reporter_code, "36");
    }

    #[test]
    fn test_flow_parse() {
        assert_eq!("2".parse::<FlowDirection>().unwrap(), FlowDirection::Export);
        assert_eq!("M".parse::<FlowDirection>().unwrap(), FlowDirection::Import);
        assert!("re-export".parse::<FlowDirection>().is_err());
    }
}
