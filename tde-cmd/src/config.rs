//! Runtime configuration resolved once from the environment.

use anyhow::{anyhow, Context};
use std::time::Duration;
use tde_comtrade::client::{DEFAULT_BASE_URL, DEFAULT_REFERENCE_URL};
use tde_comtrade::fetcher::{Pacing, CHUNK_DELAY, COUNTRY_DELAY};

pub const PRIMARY_KEY_VAR: &str = "COMTRADE_PRIMARY_KEY";
pub const BASE_URL_VAR: &str = "COMTRADE_BASE_URL";
pub const REFERENCE_URL_VAR: &str = "COMTRADE_REFERENCE_URL";
pub const FORECAST_URL_VAR: &str = "FORECAST_URL";
pub const DB_PATH_VAR: &str = "TDE_DB_PATH";
pub const USER_ID_VAR: &str = "TDE_USER_ID";
pub const CHUNK_DELAY_VAR: &str = "TDE_CHUNK_DELAY_MS";
pub const COUNTRY_DELAY_VAR: &str = "TDE_COUNTRY_DELAY_MS";

pub const DEFAULT_DB_PATH: &str = "saved_queries.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub comtrade_key: Option<String>,
    pub base_url: String,
    pub reference_url: String,
    pub forecast_url: Option<String>,
    pub db_path: String,
    pub user_id: Option<String>,
    pub pacing: Pacing,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let millis = |name: &str, default: Duration| -> anyhow::Result<Duration> {
            match get(name) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .with_context(|| format!("{name} must be a whole number of milliseconds")),
                None => Ok(default),
            }
        };

        Ok(Config {
            comtrade_key: get(PRIMARY_KEY_VAR),
            base_url: get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            reference_url: get(REFERENCE_URL_VAR)
                .unwrap_or_else(|| DEFAULT_REFERENCE_URL.to_string()),
            forecast_url: get(FORECAST_URL_VAR),
            db_path: get(DB_PATH_VAR).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            user_id: get(USER_ID_VAR),
            pacing: Pacing {
                chunk_delay: millis(CHUNK_DELAY_VAR, CHUNK_DELAY)?,
                country_delay: millis(COUNTRY_DELAY_VAR, COUNTRY_DELAY)?,
                ..Pacing::default()
            },
        })
    }

    pub fn require_comtrade_key(&self) -> anyhow::Result<&str> {
        self.comtrade_key
            .as_deref()
            .ok_or_else(|| anyhow!("{PRIMARY_KEY_VAR} is not set; an API key is required to fetch trade data"))
    }

    pub fn require_forecast_url(&self) -> anyhow::Result<&str> {
        self.forecast_url
            .as_deref()
            .ok_or_else(|| anyhow!("{FORECAST_URL_VAR} is not set; it must point at the forecast server"))
    }
}
