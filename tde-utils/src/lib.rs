//! Shared utility functions for TDE crates.

/// Period string utility functions
pub mod periods {
    use crate::error::PeriodError;
    use chrono::{Datelike, NaiveDate};
    use std::fmt;
    use std::str::FromStr;

    /// A single calendar month, used as the bound of a monthly range.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct YearMonth {
        pub year: i32,
        pub month: u32,
    }

    impl YearMonth {
        /// Build a year-month, rejecting months outside 1..=12 and years
        /// that do not fit in four digits.
        pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
            if !(1..=12).contains(&month) {
                return Err(PeriodError(format!("month out of range: {month}")));
            }
            if !(0..=9999).contains(&year) {
                return Err(PeriodError(format!("year out of range: {year}")));
            }
            Ok(Self { year, month })
        }

        /// Number of months since January of year 0.
        pub fn ordinal(&self) -> i64 {
            i64::from(self.year) * 12 + i64::from(self.month) - 1
        }

        /// Inverse of [`YearMonth::ordinal`].
        pub fn from_ordinal(ordinal: i64) -> Self {
            Self {
                year: ordinal.div_euclid(12) as i32,
                month: ordinal.rem_euclid(12) as u32 + 1,
            }
        }
    }

    impl fmt::Display for YearMonth {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:04}-{:02}", self.year, self.month)
        }
    }

    /// Parses either "YYYY-MM" or the compact "YYYYMM" form.
    impl FromStr for YearMonth {
        type Err = PeriodError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let s = s.trim();
            let (date, format) = match (s.len(), s.as_bytes().get(4)) {
                (7, Some(b'-')) => (format!("{s}-01"), "%Y-%m-%d"),
                (6, _) => (format!("{s}01"), "%Y%m%d"),
                _ => return Err(PeriodError(format!("expected YYYY-MM, got {s:?}"))),
            };
            if !s.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
                return Err(PeriodError(format!("expected YYYY-MM, got {s:?}")));
            }
            let date = NaiveDate::parse_from_str(&date, format)
                .map_err(|e| PeriodError(format!("invalid year-month {s:?}: {e}")))?;
            YearMonth::new(date.year(), date.month())
        }
    }

    /// Parse a four digit year.
    pub fn parse_year(s: &str) -> Result<i32, PeriodError> {
        let s = s.trim();
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PeriodError(format!("expected a four digit year, got {s:?}")));
        }
        NaiveDate::parse_from_str(&format!("{s}0101"), "%Y%m%d")
            .map(|date| date.year())
            .map_err(|e| PeriodError(format!("invalid year {s:?}: {e}")))
    }

    /// True for a six digit "YYYYMM" string.
    pub fn is_compact_month(s: &str) -> bool {
        s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit())
    }

    /// Rewrite a compact "YYYYMM" period as "YYYY-MM". Anything else is
    /// returned unchanged.
    pub fn dashed_period(s: &str) -> String {
        if is_compact_month(s) {
            format!("{}-{}", &s[..4], &s[4..])
        } else {
            s.to_string()
        }
    }

    /// Strip the dash from a "YYYY-MM" period ("2022-01" -> "202201").
    pub fn compact_period(s: &str) -> String {
        s.replace('-', "")
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, Clone, PartialEq)]
    pub struct PeriodError(pub String);

    impl fmt::Display for PeriodError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Period error: {}", self.0)
        }
    }

    impl std::error::Error for PeriodError {}
}
