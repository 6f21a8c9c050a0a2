//! Dispersion (Z-score) Estimator
//!
//! Standardizes the latest MVRV ratio against its own history:
//! `z = (latest - mean) / stddev` with the unbiased (n - 1) variance.
//!
//! A degraded variant standardizes a single ratio against fixed
//! historical constants when no history is available. Its result is
//! labeled [`ZScoreMethod::HistoricalConstants`] so callers can tell.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stats;
use crate::error::{Result, SentinelError};
use crate::source::RatioHistorySource;

/// Default history length (four years of daily samples)
pub const DEFAULT_LOOKBACK_DAYS: usize = 1460;

/// Approximate long-run MVRV mean used by the degraded path.
/// Placeholder: not derived from a cited dataset, calibrate before relying on it.
pub const FALLBACK_MEAN: f64 = 1.5;

/// Approximate long-run MVRV standard deviation used by the degraded path.
/// Placeholder, same caveat as [`FALLBACK_MEAN`].
pub const FALLBACK_STD_DEV: f64 = 1.2;

/// How a Z-score was derived
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreMethod {
    /// Mean and deviation of the fetched sample history
    SampleHistory,

    /// Fixed approximate constants (degraded precision)
    HistoricalConstants,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispersionResult {
    /// Latest ratio sample
    pub current_ratio: f64,

    pub z_score: f64,

    /// Samples behind the mean and deviation (1 for the degraded path)
    pub sample_size: usize,

    pub method: ZScoreMethod,

    /// Where the samples came from and how they were used
    pub source: String,

    pub computed_at: DateTime<Utc>,
}

impl DispersionResult {
    pub const fn is_degraded(&self) -> bool {
        matches!(self.method, ZScoreMethod::HistoricalConstants)
    }
}

/// Z-score of the first (most recent) sample against the whole sample.
///
/// Zero when fewer than two samples exist or the deviation is zero.
pub fn z_score(samples: &[f64]) -> f64 {
    let (Some(&latest), Some(mean), Some(variance)) = (
        samples.first(),
        stats::mean(samples),
        stats::sample_variance(samples),
    ) else {
        return 0.0;
    };

    let std_dev = stats::newton_sqrt(variance);
    if std_dev == 0.0 {
        return 0.0;
    }

    (latest - mean) / std_dev
}

#[derive(Clone, Debug)]
pub struct DispersionEstimator {
    lookback: usize,
}

impl Default for DispersionEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK_DAYS)
    }
}

impl DispersionEstimator {
    pub const fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub const fn lookback(&self) -> usize {
        self.lookback
    }

    /// Standardize the most recent sample against `samples` (most recent first)
    pub fn compute(&self, samples: &[f64], now: DateTime<Utc>) -> Result<DispersionResult> {
        let Some(&current_ratio) = samples.first() else {
            return Err(SentinelError::EmptyData("no ratio samples".into()));
        };

        let z = z_score(samples);
        tracing::debug!(current_ratio, z_score = z, samples = samples.len(), "Dispersion computed");

        Ok(DispersionResult {
            current_ratio,
            z_score: z,
            sample_size: samples.len(),
            method: ZScoreMethod::SampleHistory,
            source: format!("{}-day sample history", samples.len()),
            computed_at: now,
        })
    }

    /// Degraded single-point Z-score against the fixed constants
    pub fn fallback(&self, current_ratio: f64, now: DateTime<Utc>) -> DispersionResult {
        DispersionResult {
            current_ratio,
            z_score: (current_ratio - FALLBACK_MEAN) / FALLBACK_STD_DEV,
            sample_size: 1,
            method: ZScoreMethod::HistoricalConstants,
            source: format!(
                "approximate: fixed mean {FALLBACK_MEAN} / stddev {FALLBACK_STD_DEV}"
            ),
            computed_at: now,
        }
    }

    /// Fetch `lookback` samples from `source` and standardize the latest one.
    ///
    /// Transport failures surface as `EmptyData`.
    pub async fn estimate(&self, source: &dyn RatioHistorySource) -> Result<DispersionResult> {
        let samples = source.fetch_ratios(self.lookback).await.map_err(|e| {
            tracing::warn!("Ratio history unavailable from {}: {}", source.name(), e);
            SentinelError::EmptyData(format!("{}: {e}", source.name()))
        })?;

        let mut result = self.compute(&samples, Utc::now())?;
        result.source = format!("{} ({})", source.name(), result.source);
        Ok(result)
    }

    /// Degraded path: latest ratio from `source` against the fixed constants
    pub async fn estimate_fallback(
        &self,
        source: &dyn RatioHistorySource,
    ) -> Result<DispersionResult> {
        let latest = source.fetch_latest().await.map_err(|e| {
            tracing::warn!("Latest ratio unavailable from {}: {}", source.name(), e);
            SentinelError::EmptyData(format!("{}: {e}", source.name()))
        })?;

        let mut result = self.fallback(latest, Utc::now());
        result.source = format!("{} ({})", source.name(), result.source);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticRatioSource;

    #[test]
    fn test_two_samples_use_divisor_one() {
        // mean 2, variance (1 + 1) / 1 = 2, z = (3 - 2) / sqrt(2)
        let z = z_score(&[3.0, 1.0]);
        assert!((z - 1.0 / std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_is_zero() {
        let result = DispersionEstimator::default().compute(&[2.7], Utc::now()).unwrap();
        assert_eq!(result.z_score, 0.0);
        assert_eq!(result.sample_size, 1);
        assert_eq!(result.current_ratio, 2.7);
    }

    #[test]
    fn test_flat_history_is_zero() {
        assert_eq!(z_score(&[1.8; 30]), 0.0);
    }

    #[test]
    fn test_latest_sample_is_first() {
        // Hot latest reading against a calm history
        let mut samples = vec![3.9];
        samples.extend([1.0, 1.2, 0.9, 1.1, 1.0, 1.3, 0.8]);
        let result = DispersionEstimator::default().compute(&samples, Utc::now()).unwrap();
        assert_eq!(result.current_ratio, 3.9);
        assert!(result.z_score > 2.0);
        assert_eq!(result.method, ZScoreMethod::SampleHistory);
    }

    #[test]
    fn test_empty_samples() {
        let err = DispersionEstimator::default().compute(&[], Utc::now()).unwrap_err();
        assert!(matches!(err, SentinelError::EmptyData(_)));
    }

    #[test]
    fn test_fallback_is_labeled() {
        let result = DispersionEstimator::default().fallback(2.7, Utc::now());
        assert!((result.z_score - 1.0).abs() < 1e-12);
        assert!(result.is_degraded());
        assert!(result.source.contains("approximate"));
    }

    #[tokio::test]
    async fn test_estimate_respects_lookback() {
        let source = StaticRatioSource::new(vec![5.0, 1.0, 1.0, 1.0, 100.0]);
        let result = DispersionEstimator::new(4).estimate(&source).await.unwrap();
        assert_eq!(result.sample_size, 4);
        assert!(result.source.starts_with("StaticRatios"));
        assert!((result.z_score - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_estimate_with_no_history() {
        let source = StaticRatioSource::new(Vec::new());
        let err = DispersionEstimator::default().estimate(&source).await.unwrap_err();
        assert!(matches!(err, SentinelError::EmptyData(_)));
    }
}
