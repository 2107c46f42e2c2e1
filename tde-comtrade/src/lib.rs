pub mod catalog;
pub mod chunk;
#[cfg(feature = "api")]
pub mod client;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod period;
pub mod query;
pub mod record;
