use crate::error::{ComtradeError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// The two reference lists used to populate country selectors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CatalogKind {
    Reporters,
    Partners,
}

impl CatalogKind {
    /// File name under the Comtrade reference directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            CatalogKind::Reporters => "Reporters.json",
            CatalogKind::Partners => "partnerAreas.json",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Reporters => f.write_str("reporters"),
            CatalogKind::Partners => f.write_str("partners"),
        }
    }
}

impl FromStr for CatalogKind {
    type Err = ComtradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "reporters" => Ok(CatalogKind::Reporters),
            "partners" => Ok(CatalogKind::Partners),
            other => Err(ComtradeError::UnknownCatalog(other.to_string())),
        }
    }
}

/// One selectable country or area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "de_code")]
    pub id: String,
    pub text: String,
}

/// A reference list as published by Comtrade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub results: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn parse(body: &str) -> Result<Catalog> {
        Ok(serde_json::from_str(body)?)
    }

    /// Display name for a country code.
    pub fn name_of(&self, code: &str) -> Option<&str> {
        let code = code.trim();
        self.results
            .iter()
            .find(|entry| entry.id == code)
            .map(|entry| entry.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Text(String),
    Number(i64),
}

fn de_code<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawCode::deserialize(deserializer)? {
        RawCode::Text(s) => s,
        RawCode::Number(n) => n.to_string(),
    })
}
