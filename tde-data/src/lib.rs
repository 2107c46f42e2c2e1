//! Data processing for fetched trade records.
//!
//! This crate turns raw records into forms suitable for charting, export
//! and forecasting: per-country unit price series, a period-indexed wide
//! table, forecast payloads and delimited text.

pub mod export;
pub mod forecast;
pub mod pipeline;
pub mod series;
pub mod wide;
