//! Saved-query row structs.

use serde::Serialize;
use tde_comtrade::query::QuerySpec;

/// A saved query as stored, including its owner and creation time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SavedQuery {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub reporter_code: String,
    pub partner_code: String,
    /// Harmonized System commodity code
    pub hs_code: String,
    /// `M` (import) or `X` (export)
    pub flow_code: String,
    /// `A` (annual) or `M` (monthly)
    pub frequency: String,
    pub period_start: String,
    pub period_end: String,
    /// RFC 3339 timestamp
    pub created_at: String,
}

/// The columns written for a new saved query, minus owner and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    pub reporter_code: String,
    pub partner_code: String,
    pub hs_code: String,
    pub flow_code: String,
    pub frequency: String,
    pub period_start: String,
    pub period_end: String,
}

impl From<&QuerySpec> for QuerySnapshot {
    fn from(spec: &QuerySpec) -> Self {
        QuerySnapshot {
            reporter_code: spec.reporter_code.clone(),
            partner_code: spec.partner_code.clone(),
            hs_code: spec.commodity_code.clone(),
            flow_code: spec.flow.code().to_string(),
            frequency: spec.frequency.code().to_string(),
            period_start: spec
                .period_start()
                .map(ToString::to_string)
                .unwrap_or_default(),
            period_end: spec
                .period_end()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}
