//! Indicator Aggregator
//!
//! Runs the three estimators against injected sources and folds their
//! results, plus the externally supplied signals, into one snapshot.
//!
//! Failure policy:
//! - valuation fails: the whole collection fails (it feeds the breakers)
//! - trend fails: neutral `TrendZone::Normal`
//! - dispersion fails: degraded constant fallback when enabled, else `0.0`

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::indicators::{
    DispersionEstimator, DispersionResult, TrendEstimator, TrendResult, ValuationEstimator,
    ValuationResult,
};
use crate::model::{BandPosition, MarketSnapshot, TrendZone};
use crate::source::{PriceHistorySource, RatioHistorySource};

/// Z-score used when no dispersion estimate is available
pub const NEUTRAL_DISPERSION_Z: f64 = 0.0;

/// Trend zone used when no trend estimate is available
pub const NEUTRAL_TREND_ZONE: TrendZone = TrendZone::Normal;

/// Signals that do not come from price or ratio history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalSignals {
    pub account_leverage: f64,
    pub trend_cross: bool,
    pub eth_band: BandPosition,
}

impl Default for ExternalSignals {
    fn default() -> Self {
        Self {
            account_leverage: 1.0,
            trend_cross: false,
            eth_band: BandPosition::Middle,
        }
    }
}

/// A snapshot together with the estimator outputs behind it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub snapshot: MarketSnapshot,
    pub valuation: ValuationResult,
    pub trend: Option<TrendResult>,
    pub dispersion: Option<DispersionResult>,
}

pub struct IndicatorAggregator {
    prices: Arc<dyn PriceHistorySource>,
    ratios: Arc<dyn RatioHistorySource>,
    valuation: ValuationEstimator,
    trend: TrendEstimator,
    dispersion: DispersionEstimator,
    eth_symbol: String,
    allow_fallback: bool,
}

impl IndicatorAggregator {
    pub fn new(prices: Arc<dyn PriceHistorySource>, ratios: Arc<dyn RatioHistorySource>) -> Self {
        Self {
            prices,
            ratios,
            valuation: ValuationEstimator::new(),
            trend: TrendEstimator::new(),
            dispersion: DispersionEstimator::default(),
            eth_symbol: "ETHUSDT".into(),
            allow_fallback: false,
        }
    }

    #[must_use]
    pub const fn with_dispersion_lookback(mut self, days: usize) -> Self {
        self.dispersion = DispersionEstimator::new(days);
        self
    }

    /// Permit the constant-based Z-score when the ratio history is unavailable
    #[must_use]
    pub const fn with_fallback(mut self, enabled: bool) -> Self {
        self.allow_fallback = enabled;
        self
    }

    /// Label naming both data sources
    pub fn source_label(&self) -> String {
        format!("{} + {}", self.prices.name(), self.ratios.name())
    }

    /// Gather every indicator concurrently and build a snapshot
    pub async fn collect(&self, external: &ExternalSignals) -> Result<IndicatorReport> {
        let (valuation, trend, dispersion, price_eth) = futures::join!(
            self.valuation.estimate(self.prices.as_ref()),
            self.trend.estimate(self.prices.as_ref()),
            self.collect_dispersion(),
            self.latest_eth_price(),
        );

        let valuation = valuation?;

        let trend = match trend {
            Ok(trend) => Some(trend),
            Err(e) => {
                tracing::warn!("Trend multiple unavailable, using {}: {}", NEUTRAL_TREND_ZONE, e);
                None
            }
        };

        let snapshot = MarketSnapshot {
            price_btc: valuation.current_price,
            price_eth,
            valuation_index: valuation.index,
            dispersion_z: dispersion.as_ref().map_or(NEUTRAL_DISPERSION_Z, |d| d.z_score),
            trend_zone: trend.as_ref().map_or(NEUTRAL_TREND_ZONE, |t| t.zone),
            trend_cross: external.trend_cross,
            eth_band: external.eth_band,
            account_leverage: external.account_leverage,
            timestamp: Utc::now(),
            source: self.source_label(),
        };

        tracing::info!(
            index = snapshot.valuation_index,
            z = snapshot.dispersion_z,
            trend = %snapshot.trend_zone,
            "Indicators collected"
        );

        Ok(IndicatorReport {
            snapshot,
            valuation,
            trend,
            dispersion,
        })
    }

    async fn collect_dispersion(&self) -> Option<DispersionResult> {
        match self.dispersion.estimate(self.ratios.as_ref()).await {
            Ok(result) => return Some(result),
            Err(e) if !self.allow_fallback => {
                tracing::warn!(
                    "Dispersion unavailable, using neutral Z {}: {}",
                    NEUTRAL_DISPERSION_Z,
                    e
                );
                return None;
            }
            Err(e) => tracing::warn!("Dispersion history unavailable, trying fallback: {}", e),
        }

        match self.dispersion.estimate_fallback(self.ratios.as_ref()).await {
            Ok(result) => {
                tracing::warn!("Using degraded Z-score: {}", result.source);
                Some(result)
            }
            Err(e) => {
                tracing::warn!("Dispersion fallback failed, using neutral Z: {}", e);
                None
            }
        }
    }

    async fn latest_eth_price(&self) -> f64 {
        match self.prices.fetch_closes(&self.eth_symbol, 1).await {
            Ok(series) => series.latest().unwrap_or(0.0),
            Err(e) => {
                tracing::warn!("{} price unavailable: {}", self.eth_symbol, e);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::SentinelError;
    use crate::indicators::{TREND_WINDOW, VALUATION_WINDOW, ZScoreMethod};
    use crate::source::{StaticPriceSource, StaticRatioSource};

    /// Serves only single-sample requests, like an API without history access
    struct LatestOnly(f64);

    #[async_trait]
    impl RatioHistorySource for LatestOnly {
        async fn fetch_ratios(&self, lookback: usize) -> Result<Vec<f64>> {
            if lookback > 1 {
                return Err(SentinelError::Transport("history not available".into()));
            }
            Ok(vec![self.0])
        }

        fn name(&self) -> &str {
            "LatestOnly"
        }
    }

    fn full_prices() -> StaticPriceSource {
        StaticPriceSource::new()
            .with_constant("BTCUSDT", 95_000.0, TREND_WINDOW)
            .with_constant("ETHUSDT", 3_500.0, 10)
    }

    #[tokio::test]
    async fn test_collect_full_snapshot() {
        let aggregator = IndicatorAggregator::new(
            Arc::new(full_prices()),
            Arc::new(StaticRatioSource::new(vec![2.0, 1.0, 1.0, 1.0])),
        );

        let external = ExternalSignals {
            account_leverage: 1.2,
            trend_cross: true,
            eth_band: BandPosition::Upper,
        };
        let report = aggregator.collect(&external).await.unwrap();
        let snapshot = &report.snapshot;

        assert_eq!(snapshot.price_btc, 95_000.0);
        assert_eq!(snapshot.price_eth, 3_500.0);
        assert_eq!(snapshot.valuation_index, report.valuation.index);
        assert_eq!(snapshot.trend_zone, TrendZone::Normal);
        assert!(snapshot.trend_cross);
        assert_eq!(snapshot.eth_band, BandPosition::Upper);
        assert_eq!(snapshot.account_leverage, 1.2);
        assert!((snapshot.dispersion_z - 1.5).abs() < 1e-9);
        assert_eq!(snapshot.source, "StaticPrices + StaticRatios");
        assert!(report.trend.is_some());
    }

    #[tokio::test]
    async fn test_valuation_failure_aborts() {
        let prices =
            StaticPriceSource::new().with_constant("BTCUSDT", 95_000.0, VALUATION_WINDOW - 1);
        let aggregator =
            IndicatorAggregator::new(Arc::new(prices), Arc::new(StaticRatioSource::new(vec![1.0])));

        let err = aggregator.collect(&ExternalSignals::default()).await.unwrap_err();
        assert!(matches!(err, SentinelError::InsufficientData { .. }));
    }

    #[tokio::test]
    async fn test_missing_trend_and_dispersion_use_neutral_defaults() {
        // Enough for the valuation window, not for the trend window; no ETH either
        let prices = StaticPriceSource::new().with_constant("BTCUSDT", 95_000.0, VALUATION_WINDOW);
        let aggregator = IndicatorAggregator::new(
            Arc::new(prices),
            Arc::new(StaticRatioSource::new(Vec::new())),
        );

        let report = aggregator.collect(&ExternalSignals::default()).await.unwrap();
        assert!(report.trend.is_none());
        assert!(report.dispersion.is_none());
        assert_eq!(report.snapshot.trend_zone, NEUTRAL_TREND_ZONE);
        assert_eq!(report.snapshot.dispersion_z, NEUTRAL_DISPERSION_Z);
        assert_eq!(report.snapshot.price_eth, 0.0);
    }

    #[tokio::test]
    async fn test_fallback_only_when_enabled() {
        let disabled = IndicatorAggregator::new(Arc::new(full_prices()), Arc::new(LatestOnly(2.7)));
        let report = disabled.collect(&ExternalSignals::default()).await.unwrap();
        assert!(report.dispersion.is_none());

        let enabled = IndicatorAggregator::new(Arc::new(full_prices()), Arc::new(LatestOnly(2.7)))
            .with_fallback(true);
        let report = enabled.collect(&ExternalSignals::default()).await.unwrap();
        let dispersion = report.dispersion.unwrap();
        assert_eq!(dispersion.method, ZScoreMethod::HistoricalConstants);
        assert!((report.snapshot.dispersion_z - 1.0).abs() < 1e-12);
    }
}
