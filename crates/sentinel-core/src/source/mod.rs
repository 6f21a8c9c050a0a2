//! Market Data Sources
//!
//! Abstractions over where daily closes and MVRV ratio samples come from.
//! Estimators take a source as a parameter; none of them owns one.

mod memory;

pub use memory::{StaticPriceSource, StaticRatioSource};

use async_trait::async_trait;

use crate::error::{Result, SentinelError};
use crate::model::PriceSeries;

/// Daily close history provider (Strategy pattern)
///
/// Implement this for each venue: Binance, CSV files, fixtures, etc.
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// Up to `limit` daily closes for `symbol`, oldest first.
    ///
    /// A short series is not an error here; the estimator decides whether
    /// it has enough data.
    async fn fetch_closes(&self, symbol: &str, limit: usize) -> Result<PriceSeries>;

    /// Source name used in snapshot labels
    fn name(&self) -> &str;
}

/// Daily market-cap ratio (MVRV) history provider
#[async_trait]
pub trait RatioHistorySource: Send + Sync {
    /// Up to `lookback` daily samples, most recent first
    async fn fetch_ratios(&self, lookback: usize) -> Result<Vec<f64>>;

    /// Most recent sample only
    async fn fetch_latest(&self) -> Result<f64> {
        self.fetch_ratios(1)
            .await?
            .first()
            .copied()
            .ok_or_else(|| SentinelError::EmptyData(format!("{} returned no samples", self.name())))
    }

    fn name(&self) -> &str;
}

/// Parse one raw sample, rejecting non-numeric and non-finite values
pub fn parse_sample(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SentinelError::MalformedSample(raw.to_string())),
    }
}

/// Parse raw samples, skipping malformed entries.
///
/// Skipped entries are logged; a result emptied by skipping is
/// [`SentinelError::EmptyData`].
pub fn parse_samples<'a, I>(raw: I, what: &str) -> Result<Vec<f64>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut values = Vec::new();
    let mut skipped = 0_usize;

    for entry in raw {
        match parse_sample(entry) {
            Ok(value) => values.push(value),
            Err(e) => {
                skipped += 1;
                tracing::debug!("Skipping {}: {}", what, e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} malformed {} entries", skipped, what);
    }

    if values.is_empty() {
        return Err(SentinelError::EmptyData(format!("no usable {what} entries")));
    }

    Ok(values)
}
