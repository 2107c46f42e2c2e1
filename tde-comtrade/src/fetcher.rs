//! Sequential, rate-limited fetching of query chunks.
//!
//! The Comtrade data endpoint throttles each caller, so requests never
//! overlap: every (country, chunk) pair is fetched one after another with a
//! pause between chunks and a longer pause between countries. A failed chunk
//! is logged and recorded and counts as zero records; it never stops the
//! remaining chunks or countries.

use crate::{
    chunk::PERIODS_PER_REQUEST,
    error::Result,
    query::{ChunkRequest, QuerySpec},
    record::TradeRecord,
};
use async_trait::async_trait;
use log::{info, warn};
use std::time::Duration;

/// Pause before every chunk of a country except its first.
pub const CHUNK_DELAY: Duration = Duration::from_secs(2);

/// Pause before every country except the first.
pub const COUNTRY_DELAY: Duration = Duration::from_secs(4);

/// Anything that can answer one page of a trade query.
#[async_trait]
pub trait TradeSource {
    async fn fetch_chunk(&self, request: &ChunkRequest<'_>) -> Result<Vec<TradeRecord>>;
}

/// Delays and page size used by [`PacedFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub chunk_delay: Duration,
    pub country_delay: Duration,
    pub chunk_size: usize,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            chunk_delay: CHUNK_DELAY,
            country_delay: COUNTRY_DELAY,
            chunk_size: PERIODS_PER_REQUEST,
        }
    }
}

/// A chunk that produced no records because its request failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    pub chunk_index: usize,
    /// The `period` parameter of the failed request
    pub periods: String,
    pub message: String,
}

/// Everything fetched for one reporter, in chunk order, not yet deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryFetch {
    pub reporter_code: String,
    pub records: Vec<TradeRecord>,
    pub chunks_requested: usize,
    pub failures: Vec<ChunkFailure>,
}

impl CountryFetch {
    pub fn has_data(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Issues one request per (country, chunk), strictly in sequence.
pub struct PacedFetcher<S> {
    source: S,
    pacing: Pacing,
}

impl<S: TradeSource> PacedFetcher<S> {
    pub fn new(source: S, pacing: Pacing) -> Self {
        PacedFetcher { source, pacing }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Fetch every chunk of one query.
    ///
    /// Only a zero chunk size is an error; request failures are recorded in
    /// the returned [`CountryFetch`].
    pub async fn fetch_country(&self, spec: &QuerySpec) -> Result<CountryFetch> {
        let chunks = spec.chunks(self.pacing.chunk_size)?;
        let mut fetch = CountryFetch {
            reporter_code: spec.reporter_code.clone(),
            records: Vec::new(),
            chunks_requested: chunks.len(),
            failures: Vec::new(),
        };
        for chunk in &chunks {
            if chunk.index > 0 {
                tokio::time::sleep(self.pacing.chunk_delay).await;
            }
            info!(
                "Fetching chunk {}/{} for reporter {} ({})",
                chunk.index + 1,
                chunks.len(),
                spec.reporter_code,
                chunk.period_param()
            );
            match self.source.fetch_chunk(chunk).await {
                Ok(records) => {
                    info!(
                        "  {} records for reporter {} chunk {}",
                        records.len(),
                        spec.reporter_code,
                        chunk.index + 1
                    );
                    fetch.records.extend(records);
                }
                Err(e) => {
                    warn!(
                        "Chunk {}/{} failed for reporter {}: {}",
                        chunk.index + 1,
                        chunks.len(),
                        spec.reporter_code,
                        e
                    );
                    fetch.failures.push(ChunkFailure {
                        chunk_index: chunk.index,
                        periods: chunk.period_param(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(fetch)
    }

    /// Fetch several queries one after another, pausing between countries.
    pub async fn fetch_all(&self, specs: &[QuerySpec]) -> Result<Vec<CountryFetch>> {
        let mut fetches = Vec::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if i > 0 {
                info!(
                    "Waiting {} ms before reporter {}",
                    self.pacing.country_delay.as_millis(),
                    spec.reporter_code
                );
                tokio::time::sleep(self.pacing.country_delay).await;
            }
            fetches.push(self.fetch_country(spec).await?);
        }
        Ok(fetches)
    }
}
