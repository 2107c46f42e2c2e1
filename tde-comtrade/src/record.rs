use crate::{
    error::{ComtradeError, Result},
    period::PeriodToken,
};
use serde::{de, Deserialize, Deserializer, Serialize};

/// A single row returned by the Comtrade data endpoint: one period for one
/// reporter/partner/commodity/flow combination.
///
/// Upstream nulls are read as zero or empty. Unit price is derived on demand
/// and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(deserialize_with = "de_period")]
    pub period: PeriodToken,
    #[serde(rename = "reporterDesc", default, deserialize_with = "de_text")]
    pub reporter_description: String,
    #[serde(rename = "partnerDesc", default, deserialize_with = "de_text")]
    pub partner_description: String,
    #[serde(rename = "cmdDesc", default, deserialize_with = "de_text")]
    pub commodity_description: String,
    #[serde(rename = "flowDesc", default, deserialize_with = "de_text")]
    pub flow_description: String,
    /// Trade value in US dollars
    #[serde(rename = "primaryValue", default, deserialize_with = "de_amount")]
    pub trade_value_usd: f64,
    /// Net weight in kilograms
    #[serde(rename = "netWgt", default, deserialize_with = "de_amount")]
    pub net_weight_kg: f64,
    #[serde(rename = "qtyUnitAbbr", default, deserialize_with = "de_text")]
    pub quantity_unit: String,
    #[serde(rename = "refPeriodDesc", default, deserialize_with = "de_text")]
    pub period_description: String,
}

impl TradeRecord {
    /// USD per kilogram, when the record carries a positive net weight.
    pub fn unit_price(&self) -> Option<f64> {
        (self.net_weight_kg > 0.0).then(|| self.trade_value_usd / self.net_weight_kg)
    }
}

/// Envelope of the data endpoint. Older payloads used `results`.
#[derive(Debug, Deserialize)]
struct DataResponse {
    #[serde(alias = "results", default)]
    data: Option<Vec<TradeRecord>>,
}

/// Decode a data endpoint body into trade records.
pub fn parse_data_response(body: &str) -> Result<Vec<TradeRecord>> {
    let response: DataResponse = serde_json::from_str(body)?;
    Ok(response.data.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPeriod {
    Text(String),
    Number(i64),
}

fn de_period<'de, D>(deserializer: D) -> std::result::Result<PeriodToken, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match RawPeriod::deserialize(deserializer)? {
        RawPeriod::Text(s) => s,
        RawPeriod::Number(n) => n.to_string(),
    };
    raw.parse()
        .map_err(|e: ComtradeError| de::Error::custom(e.to_string()))
}

fn de_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
