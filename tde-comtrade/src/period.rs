use crate::error::{ComtradeError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, mem::replace, str::FromStr};
use tde_utils::periods::{compact_period, is_compact_month, parse_year, YearMonth};

/// Reporting frequency of a trade query.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Annual,
    Monthly,
}

impl Frequency {
    /// Comtrade `freqCode` value.
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Annual => "A",
            Frequency::Monthly => "M",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = ComtradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "annual" => Ok(Frequency::Annual),
            "m" | "monthly" => Ok(Frequency::Monthly),
            other => Err(ComtradeError::InvalidQuery(format!(
                "unknown frequency: {other}"
            ))),
        }
    }
}

/// A calendar unit encoded as `"YYYY"` or `"YYYY-MM"`.
///
/// Ordering is plain string ordering. Both shapes are fixed width and zero
/// padded, so it agrees with chronological order as long as a collection
/// holds a single shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodToken(String);

impl PeriodToken {
    pub fn year(year: i32) -> Self {
        PeriodToken(format!("{year:04}"))
    }

    pub fn month(year_month: YearMonth) -> Self {
        PeriodToken(year_month.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn frequency(&self) -> Frequency {
        if self.0.len() == 4 {
            Frequency::Annual
        } else {
            Frequency::Monthly
        }
    }

    /// The form the Comtrade `period` parameter expects: `"YYYY"` or `"YYYYMM"`.
    pub fn api_code(&self) -> String {
        compact_period(&self.0)
    }
}

impl fmt::Display for PeriodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts `"YYYY"`, `"YYYY-MM"` and the upstream compact `"YYYYMM"`,
/// normalizing months to `"YYYY-MM"`.
impl FromStr for PeriodToken {
    type Err = ComtradeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() == 4 {
            return Ok(PeriodToken::year(parse_year(s)?));
        }
        if is_compact_month(s) || s.len() == 7 {
            return Ok(PeriodToken::month(s.parse()?));
        }
        Err(ComtradeError::InvalidQuery(format!("unrecognized period: {s:?}")))
    }
}

/// A month range iterator that yields each month from the start month
/// through the end month (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct MonthRange(pub YearMonth, pub YearMonth);

impl Iterator for MonthRange {
    type Item = YearMonth;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = YearMonth::from_ordinal(self.0.ordinal() + 1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

/// User selected bounds of a query, before expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodSelection {
    Annual { start: i32, end: i32 },
    Monthly { start: YearMonth, end: YearMonth },
}

impl PeriodSelection {
    /// Parse bounds for the given frequency: years for annual, `YYYY-MM`
    /// for monthly.
    pub fn parse(frequency: Frequency, start: &str, end: &str) -> Result<Self> {
        Ok(match frequency {
            Frequency::Annual => PeriodSelection::Annual {
                start: parse_year(start)?,
                end: parse_year(end)?,
            },
            Frequency::Monthly => PeriodSelection::Monthly {
                start: start.parse()?,
                end: end.parse()?,
            },
        })
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            PeriodSelection::Annual { .. } => Frequency::Annual,
            PeriodSelection::Monthly { .. } => Frequency::Monthly,
        }
    }

    /// Every period token in the inclusive range, ascending. An end before
    /// the start gives an empty list.
    pub fn expand(&self) -> Vec<PeriodToken> {
        match *self {
            PeriodSelection::Annual { start, end } => {
                (start..=end).map(PeriodToken::year).collect()
            }
            PeriodSelection::Monthly { start, end } => {
                MonthRange(start, end).map(PeriodToken::month).collect()
            }
        }
    }
}

/// Join tokens into a Comtrade `period` parameter.
pub fn join_periods(tokens: &[PeriodToken]) -> String {
    tokens
        .iter()
        .map(PeriodToken::api_code)
        .collect::<Vec<_>>()
        .join(",")
}
