//! Wire types and client for the external forecasting service.
//!
//! The service takes named input series (`X1` is the dependent series,
//! `X2`..`X5` optional exogenous ones), a horizon and the last known period,
//! and answers with an array of `{period, value}` points.

use crate::error::{ComtradeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of a forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub inputs: BTreeMap<String, Vec<f64>>,
    pub horizon: u32,
    #[serde(rename = "lastDate")]
    pub last_known_period: String,
}

/// One forecast point returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: String,
    pub value: f64,
}

/// Decode a forecast response body. Anything but an array of
/// `{period, value}` objects is a contract violation.
pub fn parse_forecast_response(body: &str) -> Result<Vec<ForecastPoint>> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if !value.is_array() {
        return Err(ComtradeError::Contract(
            "expected an array of {period, value} objects".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ComtradeError::Contract(e.to_string()))
}

/// Anything that can answer a forecast request.
#[async_trait]
pub trait ForecastService {
    async fn forecast(&self, request: &ForecastRequest) -> Result<Vec<ForecastPoint>>;
}

#[cfg(feature = "api")]
pub use self::http::ForecastClient;

#[cfg(feature = "api")]
mod http {
    use super::{parse_forecast_response, ForecastPoint, ForecastRequest, ForecastService};
    use crate::error::{excerpt, ComtradeError, Result};
    use async_trait::async_trait;
    use log::info;
    use reqwest::Client;
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// POSTs requests to `{base_url}/forecast`.
    pub struct ForecastClient {
        client: Client,
        base_url: String,
    }

    impl ForecastClient {
        pub fn new(base_url: impl Into<String>) -> Result<Self> {
            let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
            Ok(ForecastClient {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            })
        }
    }

    #[async_trait]
    impl ForecastService for ForecastClient {
        async fn forecast(&self, request: &ForecastRequest) -> Result<Vec<ForecastPoint>> {
            let url = format!("{}/forecast", self.base_url);
            info!(
                "Requesting {}-period forecast with inputs {:?}",
                request.horizon,
                request.inputs.keys().collect::<Vec<_>>()
            );
            let response = self.client.post(&url).json(request).send().await?;
            let status = response.status();
            // The model server answers JSON as plain text, so the content
            // type is not checked here.
            let body = response.text().await?;
            if !status.is_success() {
                return Err(ComtradeError::Status {
                    service: "Forecast service",
                    status: status.as_u16(),
                    body: excerpt(&body),
                });
            }
            parse_forecast_response(&body)
        }
    }
}
