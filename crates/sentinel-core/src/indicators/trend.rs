//! Trend Multiple Estimator (two-year MA multiplier)
//!
//! Compares the current close with the 730-day simple moving average and
//! with five times that average.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stats;
use crate::error::{Result, SentinelError};
use crate::model::{PriceSeries, TrendZone};
use crate::source::PriceHistorySource;

/// Closes in the moving-average window
pub const TREND_WINDOW: usize = 730;

/// Upper band as a multiple of the moving average
pub const UPPER_BAND_MULTIPLE: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub current_price: f64,

    /// 730-day simple moving average
    pub moving_average: f64,

    /// `moving_average * 5`
    pub upper_band: f64,

    /// `current_price / moving_average`
    pub multiple: f64,

    pub zone: TrendZone,

    pub computed_at: DateTime<Utc>,
}

/// Place a price against its moving average and upper band.
///
/// Both boundaries are strict: a price equal to the average or to the
/// upper band is `Normal`.
pub fn classify(price: f64, moving_average: f64, upper_band: f64) -> TrendZone {
    if price < moving_average {
        TrendZone::BelowBand
    } else if price > upper_band {
        TrendZone::AboveUpperBand
    } else {
        TrendZone::Normal
    }
}

#[derive(Clone, Debug)]
pub struct TrendEstimator {
    symbol: String,
    window: usize,
}

impl Default for TrendEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendEstimator {
    pub fn new() -> Self {
        Self {
            symbol: "BTCUSDT".into(),
            window: TREND_WINDOW,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub const fn window(&self) -> usize {
        self.window
    }

    /// Compute the multiple over the most recent `window` closes.
    ///
    /// The latest close must be a positive price (`MalformedSample` otherwise).
    pub fn compute(&self, series: &PriceSeries, now: DateTime<Utc>) -> Result<TrendResult> {
        if series.len() < self.window {
            return Err(SentinelError::InsufficientData {
                required: self.window,
                actual: series.len(),
            });
        }

        let window = series.tail(self.window);
        let current_price = window[window.len() - 1];
        if current_price <= 0.0 || !current_price.is_finite() {
            return Err(SentinelError::MalformedSample(format!(
                "latest {} close is {current_price}",
                series.symbol
            )));
        }
        let moving_average = stats::mean(window).ok_or_else(|| {
            SentinelError::EmptyData(format!("no closes for {}", series.symbol))
        })?;
        let upper_band = moving_average * UPPER_BAND_MULTIPLE;
        let zone = classify(current_price, moving_average, upper_band);

        tracing::debug!(
            symbol = %series.symbol,
            current_price,
            moving_average,
            zone = %zone,
            "Trend multiple computed"
        );

        Ok(TrendResult {
            current_price,
            moving_average,
            upper_band,
            multiple: current_price / moving_average,
            zone,
            computed_at: now,
        })
    }

    /// Fetch the window from `source` and compute the multiple
    pub async fn estimate(&self, source: &dyn PriceHistorySource) -> Result<TrendResult> {
        let series = source
            .fetch_closes(&self.symbol, self.window)
            .await
            .map_err(|e| {
                tracing::warn!("{} closes unavailable from {}: {}", self.symbol, source.name(), e);
                SentinelError::InsufficientData {
                    required: self.window,
                    actual: 0,
                }
            })?;

        self.compute(&series, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticPriceSource;

    fn series_ending_at(last: f64) -> PriceSeries {
        let mut closes = vec![100.0; TREND_WINDOW - 1];
        closes.push(last);
        PriceSeries::new("BTCUSDT", closes)
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(99.0, 100.0, 500.0), TrendZone::BelowBand);
        assert_eq!(classify(100.0, 100.0, 500.0), TrendZone::Normal);
        assert_eq!(classify(500.0, 100.0, 500.0), TrendZone::Normal);
        assert_eq!(classify(500.01, 100.0, 500.0), TrendZone::AboveUpperBand);
    }

    #[test]
    fn test_constant_series_is_normal() {
        let result = TrendEstimator::new()
            .compute(&PriceSeries::new("BTCUSDT", vec![30_000.0; TREND_WINDOW]), Utc::now())
            .unwrap();
        assert_eq!(result.moving_average, 30_000.0);
        assert_eq!(result.upper_band, 150_000.0);
        assert_eq!(result.multiple, 1.0);
        assert_eq!(result.zone, TrendZone::Normal);
    }

    #[test]
    fn test_price_below_average() {
        let result = TrendEstimator::new().compute(&series_ending_at(10.0), Utc::now()).unwrap();
        assert_eq!(result.zone, TrendZone::BelowBand);
        assert!(result.multiple < 1.0);
    }

    #[test]
    fn test_blow_off_top() {
        let result = TrendEstimator::new().compute(&series_ending_at(5_000.0), Utc::now()).unwrap();
        assert_eq!(result.zone, TrendZone::AboveUpperBand);
        assert!(result.current_price > result.upper_band);
    }

    #[test]
    fn test_non_positive_latest_close_is_rejected() {
        for last in [0.0, -250.0, f64::NAN] {
            let err = TrendEstimator::new()
                .compute(&series_ending_at(last), Utc::now())
                .unwrap_err();
            assert!(matches!(err, SentinelError::MalformedSample(_)));
        }
    }

    #[test]
    fn test_insufficient_data() {
        let series = PriceSeries::new("BTCUSDT", vec![1.0; 400]);
        let err = TrendEstimator::new().compute(&series, Utc::now()).unwrap_err();
        assert!(matches!(err, SentinelError::InsufficientData { required: 730, actual: 400 }));
    }

    #[tokio::test]
    async fn test_estimate_from_source() {
        let source = StaticPriceSource::new().with_constant("BTCUSDT", 42_000.0, 1000);
        let result = TrendEstimator::new().estimate(&source).await.unwrap();
        assert_eq!(result.zone, TrendZone::Normal);
    }
}
