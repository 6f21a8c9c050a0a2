//! In-Memory Sources
//!
//! For tests and demos. Serve fixed histories without any I/O.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{PriceHistorySource, RatioHistorySource};
use crate::error::{Result, SentinelError};
use crate::model::PriceSeries;

/// Price source backed by fixed close histories
#[derive(Clone, Debug, Default)]
pub struct StaticPriceSource {
    series: HashMap<String, Vec<f64>>,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chronological close history for a symbol
    #[must_use]
    pub fn with_series(mut self, symbol: impl Into<String>, closes: Vec<f64>) -> Self {
        self.series.insert(symbol.into().to_uppercase(), closes);
        self
    }

    /// Register `days` identical closes
    #[must_use]
    pub fn with_constant(self, symbol: impl Into<String>, price: f64, days: usize) -> Self {
        self.with_series(symbol, vec![price; days])
    }
}

#[async_trait]
impl PriceHistorySource for StaticPriceSource {
    async fn fetch_closes(&self, symbol: &str, limit: usize) -> Result<PriceSeries> {
        let closes = self
            .series
            .get(&symbol.to_uppercase())
            .ok_or_else(|| SentinelError::Transport(format!("unknown symbol {symbol}")))?;

        let start = closes.len().saturating_sub(limit);
        Ok(PriceSeries::new(symbol, closes[start..].to_vec()))
    }

    fn name(&self) -> &str {
        "StaticPrices"
    }
}

/// Ratio source backed by a fixed, most-recent-first sample list
#[derive(Clone, Debug, Default)]
pub struct StaticRatioSource {
    samples: Vec<f64>,
}

impl StaticRatioSource {
    pub const fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}

#[async_trait]
impl RatioHistorySource for StaticRatioSource {
    async fn fetch_ratios(&self, lookback: usize) -> Result<Vec<f64>> {
        Ok(self.samples.iter().take(lookback).copied().collect())
    }

    fn name(&self) -> &str {
        "StaticRatios"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_prices_return_most_recent_window() {
        let source = StaticPriceSource::new().with_series("btcusdt", vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let series = source.fetch_closes("BTCUSDT", 3).await.unwrap();
        assert_eq!(series.closes, vec![3.0, 4.0, 5.0]);

        let short = source.fetch_closes("BTCUSDT", 10).await.unwrap();
        assert_eq!(short.len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_symbol() {
        let source = StaticPriceSource::new();
        assert!(source.fetch_closes("DOGEUSDT", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_static_ratios_lookback() {
        let source = StaticRatioSource::new(vec![3.0, 2.0, 1.0]);
        assert_eq!(source.fetch_ratios(2).await.unwrap(), vec![3.0, 2.0]);
    }
}
