//! One aggregation run: fetch every country, dedup, reshape.

use crate::{
    series::{dedup_records, CountrySeries},
    wide::WideTable,
};
use log::info;
use std::fmt;
use tde_comtrade::{
    catalog::Catalog,
    error::Result,
    fetcher::{ChunkFailure, CountryFetch, PacedFetcher, TradeSource},
    query::QuerySpec,
    record::TradeRecord,
};

/// Outcome counts for a run, reported once at the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationSummary {
    pub countries_requested: usize,
    pub countries_with_data: usize,
    pub chunks_requested: usize,
    /// (reporter code, failure) for every chunk that returned nothing
    pub failures: Vec<(String, ChunkFailure)>,
}

impl AggregationSummary {
    fn from_fetches(fetches: &[CountryFetch]) -> Self {
        AggregationSummary {
            countries_requested: fetches.len(),
            countries_with_data: fetches.iter().filter(|f| f.has_data()).count(),
            chunks_requested: fetches.iter().map(|f| f.chunks_requested).sum(),
            failures: fetches
                .iter()
                .flat_map(|f| {
                    f.failures
                        .iter()
                        .map(|failure| (f.reporter_code.clone(), failure.clone()))
                })
                .collect(),
        }
    }
}

impl fmt::Display for AggregationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} countries returned data ({} of {} chunks failed)",
            self.countries_with_data,
            self.countries_requested,
            self.failures.len(),
            self.chunks_requested
        )
    }
}

/// Everything one run produced. Each run starts from nothing.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Deduplicated records of every country, country by country
    pub records: Vec<TradeRecord>,
    pub series: Vec<CountrySeries>,
    pub table: WideTable,
    pub summary: AggregationSummary,
}

/// Column name for a reporter: catalog text, else the upstream description,
/// else the code itself.
fn display_name(code: &str, records: &[TradeRecord], catalog: Option<&Catalog>) -> String {
    catalog
        .and_then(|c| c.name_of(code))
        .map(str::to_string)
        .or_else(|| {
            records
                .iter()
                .map(|r| r.reporter_description.trim())
                .find(|name| !name.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| code.to_string())
}

/// Run `base` once per reporter code (in the given order) and merge the
/// results. Repeated codes are fetched once.
pub async fn aggregate<S: TradeSource>(
    fetcher: &PacedFetcher<S>,
    base: &QuerySpec,
    reporters: &[String],
    catalog: Option<&Catalog>,
) -> Result<Aggregation> {
    let mut codes: Vec<&str> = Vec::with_capacity(reporters.len());
    for code in reporters.iter().map(|c| c.trim()) {
        if !code.is_empty() && !codes.contains(&code) {
            codes.push(code);
        }
    }
    let specs: Vec<QuerySpec> = codes.iter().map(|code| base.for_reporter(code)).collect();
    info!(
        "Aggregating {} countries over {} periods",
        specs.len(),
        base.periods.len()
    );
    let fetches = fetcher.fetch_all(&specs).await?;
    let summary = AggregationSummary::from_fetches(&fetches);

    let mut records = Vec::new();
    let mut series = Vec::with_capacity(fetches.len());
    for fetch in fetches {
        let name = display_name(&fetch.reporter_code, &fetch.records, catalog);
        let deduped = dedup_records(fetch.records);
        series.push(CountrySeries::from_records(
            fetch.reporter_code,
            name,
            &deduped,
        ));
        records.extend(deduped);
    }
    let table = WideTable::from_series(&series);
    info!("{}", summary);
    Ok(Aggregation {
        records,
        series,
        table,
        summary,
    })
}
