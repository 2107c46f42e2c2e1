//! Catalog, search and compare commands.

use crate::{check_additional, config::Config, write_output, ExportFormat, QueryArgs};
use anyhow::Context;
use log::{info, warn};
use tde_comtrade::{
    catalog::{Catalog, CatalogKind},
    client::ComtradeClient,
    fetcher::PacedFetcher,
};
use tde_data::{
    export::{records_to_csv, wide_to_csv},
    pipeline::{aggregate, Aggregation},
};

pub(crate) fn comtrade_client(config: &Config) -> anyhow::Result<ComtradeClient> {
    let client = ComtradeClient::new(config.require_comtrade_key()?)
        .context("Failed to build the Comtrade HTTP client")?
        .with_base_url(&config.base_url)
        .with_reference_url(&config.reference_url);
    Ok(client)
}

/// Run the paced aggregation for the query's reporter followed by `others`.
///
/// Reporter names come from the catalog when it can be fetched; otherwise
/// the records' own descriptions are used.
pub(crate) async fn fetch_aggregation(
    config: &Config,
    query: &QueryArgs,
    others: &[String],
) -> anyhow::Result<Aggregation> {
    let spec = query.to_spec()?;
    let client = comtrade_client(config)?;
    let catalog = match client.fetch_catalog(CatalogKind::Reporters).await {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            warn!("Reporter catalog unavailable, using record descriptions: {}", e);
            None
        }
    };

    let reporters: Vec<String> = std::iter::once(spec.reporter_code.clone())
        .chain(others.iter().cloned())
        .collect();
    let fetcher = PacedFetcher::new(client, config.pacing);
    let aggregation = aggregate(&fetcher, &spec, &reporters, catalog.as_ref())
        .await
        .context("Aggregation failed")?;
    for (reporter, failure) in &aggregation.summary.failures {
        warn!(
            "Reporter {} chunk {} ({}) failed: {}",
            reporter, failure.chunk_index, failure.periods, failure.message
        );
    }
    Ok(aggregation)
}

/// Catalog entries whose name contains `search`, case-insensitively.
fn filter_catalog<'a>(catalog: &'a Catalog, search: Option<&str>) -> Vec<(&'a str, &'a str)> {
    let needle = search.map(|s| s.trim().to_lowercase());
    catalog
        .results
        .iter()
        .filter(|entry| {
            needle
                .as_deref()
                .map_or(true, |n| entry.text.to_lowercase().contains(n))
        })
        .map(|entry| (entry.id.as_str(), entry.text.as_str()))
        .collect()
}

pub async fn run_catalog(config: &Config, kind: &str, search: Option<&str>) -> anyhow::Result<()> {
    let kind: CatalogKind = kind.parse()?;
    let client = comtrade_client(config)?;
    let catalog = client
        .fetch_catalog(kind)
        .await
        .with_context(|| format!("Failed to fetch the {kind} catalog"))?;
    let mut listing = String::new();
    for (id, text) in filter_catalog(&catalog, search) {
        listing.push_str(&format!("{id}\t{text}\n"));
    }
    write_output(None, &listing)
}

/// Fetch one reporter and export its flat records.
pub async fn run_search(
    config: &Config,
    query: &QueryArgs,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let aggregation = fetch_aggregation(config, query, &[]).await?;
    if aggregation.records.is_empty() {
        warn!("No records returned for reporter {}", query.reporter);
    }
    info!("Exporting {} records", aggregation.records.len());
    write_output(output, &records_to_csv(&aggregation.records)?)
}

/// Fetch the reporter and comparison countries and export the wide table.
pub async fn run_compare(
    config: &Config,
    query: &QueryArgs,
    with: &[String],
    format: ExportFormat,
    output: Option<&str>,
) -> anyhow::Result<()> {
    check_additional(with)?;
    let aggregation = fetch_aggregation(config, query, with).await?;
    let table = &aggregation.table;
    info!(
        "Wide table: {} periods x {} countries",
        table.rows.len(),
        table.countries.len()
    );
    let rendered = match format {
        ExportFormat::Csv => wide_to_csv(table)?,
        ExportFormat::Json => table.to_json()?,
    };
    write_output(output, &rendered)
}
