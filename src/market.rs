//! Market Prices
//!
//! Commodity prices shown alongside recommendations. A live feed is tried
//! first; no feed, a feed error, or an empty answer falls back to a local
//! JSON file. This never feeds into ranking or risk.

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// One mandi (market) price record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde(default = "unknown")]
    pub state: String,
    #[serde(default = "unknown")]
    pub district: String,
    #[serde(default = "unknown")]
    pub market: String,
    #[serde(default = "unknown")]
    pub commodity: String,
    #[serde(default, deserialize_with = "price")]
    pub min_price: f64,
    #[serde(default, deserialize_with = "price")]
    pub max_price: f64,
    #[serde(default, deserialize_with = "price")]
    pub modal_price: f64,
    #[serde(default, alias = "arrival_date")]
    pub date: String,
}

fn unknown() -> String {
    "Unknown".to_string()
}

/// Prices arrive as numbers or numeric strings; null and "" mean 0
fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(0.0),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("price {} out of range", n))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0.0),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("price '{}' is not a number", s))),
        other => Err(D::Error::custom(format!("unexpected price value: {}", other))),
    }
}

/// Source of live market records
pub trait MarketFeed: Send + Sync {
    fn fetch(&self, limit: usize) -> anyhow::Result<Vec<MarketRecord>>;
}

/// Normalise a `{"records": [...]}` payload
///
/// # Errors
/// A payload without records, or with malformed records.
pub fn parse_records(payload: &serde_json::Value) -> anyhow::Result<Vec<MarketRecord>> {
    let records = payload
        .get("records")
        .and_then(|r| r.as_array())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| anyhow::anyhow!("No records found in market response"))?;

    records
        .iter()
        .map(|record| {
            MarketRecord::deserialize(record).with_context(|| "Failed to parse market record")
        })
        .collect()
}

/// Load fallback records; a missing file yields an empty list
pub fn load_fallback(path: &Path) -> anyhow::Result<Vec<MarketRecord>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Market fallback file not found: {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read market fallback: {:?}", path))
        }
    };

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse market fallback JSON: {:?}", path))
}

/// Live feed first, then the fallback file
pub fn get_market_data(
    feed: Option<&dyn MarketFeed>,
    fallback_path: &Path,
    limit: usize,
) -> anyhow::Result<Vec<MarketRecord>> {
    match feed {
        Some(feed) => match feed.fetch(limit) {
            Ok(records) if !records.is_empty() => {
                tracing::info!(records = records.len(), "Fetched live market data");
                return Ok(records);
            }
            Ok(_) => tracing::warn!("Market feed returned no records, switching to fallback data"),
            Err(e) => tracing::warn!("Market feed failed: {:#}, switching to fallback data", e),
        },
        None => tracing::debug!("No market feed configured, using fallback data"),
    }

    load_fallback(fallback_path)
}

/// data.gov.in daily commodity price resource
///
/// The blocking client lives only for the duration of `fetch`, which callers
/// run on a blocking thread; the feed itself is safe to hold in async state.
#[cfg(feature = "api")]
pub struct DataGovFeed {
    api_key: String,
    timeout: std::time::Duration,
}

#[cfg(feature = "api")]
impl DataGovFeed {
    const URL: &'static str =
        "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            timeout: std::time::Duration::from_secs(5),
        }
    }

    /// Feed from `MANDI_API_KEY`, if set
    pub fn from_env() -> Option<Self> {
        std::env::var("MANDI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Self::new)
    }
}

#[cfg(feature = "api")]
impl MarketFeed for DataGovFeed {
    fn fetch(&self, limit: usize) -> anyhow::Result<Vec<MarketRecord>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build market HTTP client")?;

        let limit = limit.to_string();
        let payload: serde_json::Value = client
            .get(Self::URL)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
            ])
            .send()
            .context("Market request failed")?
            .error_for_status()
            .context("Market API returned an error status")?
            .json()
            .context("Market response is not JSON")?;

        parse_records(&payload)
    }
}
