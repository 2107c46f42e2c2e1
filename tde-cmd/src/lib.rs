//! Command implementations for the trade data explorer CLI.
//!
//! Each subcommand is a thin layer over the library crates: build a
//! [`QuerySpec`], run the paced aggregation, then export, forecast or
//! persist the result.
//!
//! [`QuerySpec`]: tde_comtrade::query::QuerySpec

use anyhow::Context;
use clap::{Args, Subcommand, ValueEnum};
use tde_comtrade::period::{Frequency, PeriodSelection};
use tde_comtrade::query::{FlowDirection, QuerySpec, WORLD_PARTNER_CODE};
use tde_data::forecast::{ForecastError, MAX_EXOGENOUS};

pub mod config;
pub mod forecast;
pub mod query;
pub mod saved;

use config::Config;

/// Selection shared by every command that fetches or saves a query.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Reporter country code (e.g. 36 for Australia)
    #[arg(short = 'r', long)]
    pub reporter: String,

    /// Partner country code; 0 is World
    #[arg(short = 'p', long, default_value = WORLD_PARTNER_CODE)]
    pub partner: String,

    /// HS commodity code (e.g. 030631)
    #[arg(short = 'c', long)]
    pub commodity: String,

    /// Trade flow
    #[arg(short = 'f', long, value_enum, ignore_case = true, default_value = "export")]
    pub flow: FlowArg,

    /// Reporting frequency
    #[arg(long, value_enum, ignore_case = true, default_value = "monthly")]
    pub frequency: FrequencyArg,

    /// First period: YYYY for annual, YYYY-MM for monthly
    #[arg(long)]
    pub start: String,

    /// Last period, inclusive
    #[arg(long)]
    pub end: String,
}

impl QueryArgs {
    /// Validate the whole selection before anything touches the network.
    pub fn to_spec(&self) -> anyhow::Result<QuerySpec> {
        let selection = PeriodSelection::parse(self.frequency.into(), &self.start, &self.end)
            .context("Invalid period range")?;
        let spec = QuerySpec::new(
            &self.reporter,
            &self.partner,
            &self.commodity,
            self.flow.into(),
            &selection,
        )?;
        Ok(spec)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowArg {
    #[value(alias = "m")]
    Import,
    #[value(alias = "x")]
    Export,
}

impl From<FlowArg> for FlowDirection {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::Import => FlowDirection::Import,
            FlowArg::Export => FlowDirection::Export,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyArg {
    #[value(alias = "a")]
    Annual,
    #[value(alias = "m")]
    Monthly,
}

impl From<FrequencyArg> for Frequency {
    fn from(frequency: FrequencyArg) -> Self {
        match frequency {
            FrequencyArg::Annual => Frequency::Annual,
            FrequencyArg::Monthly => Frequency::Monthly,
        }
    }
}

/// The reporter plus at most four more countries; checked before fetching.
pub(crate) fn check_additional(with: &[String]) -> anyhow::Result<()> {
    if with.len() > MAX_EXOGENOUS {
        return Err(ForecastError::TooManyExogenous {
            max: MAX_EXOGENOUS,
            found: with.len(),
        }
        .into());
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List reporter or partner countries from the Comtrade reference files
    Catalog {
        /// reporters or partners
        #[arg(default_value = "reporters")]
        kind: String,

        /// Only show entries whose name contains this text
        #[arg(short = 's', long)]
        search: Option<String>,
    },

    /// Fetch one reporter's records and export them as flat CSV
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Output path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Compare unit prices of the reporter and up to four more countries
    Compare {
        #[command(flatten)]
        query: QueryArgs,

        /// Additional reporter codes to compare against
        #[arg(short = 'w', long = "with", num_args = 1.., value_delimiter = ',')]
        with: Vec<String>,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Compare, then forecast the reporter's unit price
    Forecast {
        #[command(flatten)]
        query: QueryArgs,

        /// Additional reporter codes used as exogenous series (max 4)
        #[arg(short = 'w', long = "with", num_args = 1.., value_delimiter = ',')]
        with: Vec<String>,

        /// Number of periods to forecast
        #[arg(long, default_value = "6")]
        horizon: String,

        /// Output path for the forecast band CSV (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Save a query for the current user
    SaveQuery {
        #[command(flatten)]
        query: QueryArgs,

        /// Name for the saved query (defaults to "Query <date>")
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// User id; overrides TDE_USER_ID
        #[arg(short = 'u', long)]
        user: Option<String>,
    },

    /// List the current user's saved queries
    ListQueries {
        /// User id; overrides TDE_USER_ID
        #[arg(short = 'u', long)]
        user: Option<String>,
    },
}

pub async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Catalog { kind, search } => {
            query::run_catalog(config, &kind, search.as_deref()).await
        }
        Command::Search { query, output } => {
            query::run_search(config, &query, output.as_deref()).await
        }
        Command::Compare {
            query,
            with,
            format,
            output,
        } => query::run_compare(config, &query, &with, format, output.as_deref()).await,
        Command::Forecast {
            query,
            with,
            horizon,
            output,
        } => forecast::run_forecast(config, &query, &with, &horizon, output.as_deref()).await,
        Command::SaveQuery { query, name, user } => {
            saved::run_save(config, &query, name.as_deref(), user)
        }
        Command::ListQueries { user } => saved::run_list(config, user),
    }
}

/// Write to a file, or to stdout when no path is given.
pub(crate) fn write_output(output: Option<&str>, contents: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents).with_context(|| format!("Failed to write {path}"))?;
            log::info!("Wrote {}", path);
        }
        None => print!("{contents}"),
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn query_args(frequency: FrequencyArg, start: &str, end: &str) -> QueryArgs {
    QueryArgs {
        reporter: "36".to_string(),
        partner: "156".to_string(),
        commodity: "030631".to_string(),
        flow: FlowArg::Export,
        frequency,
        start: start.to_string(),
        end: end.to_string(),
    }
}

/// Local HTTP stub that counts connections and answers each with a 500.
#[cfg(test)]
pub(crate) async fn counting_server() -> (String, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        }
    });
    (url, hits)
}
