//! Indicator Estimators
//!
//! Pure calculations over daily histories. Each estimator can compute from
//! data already in hand (`compute`) or fetch through an injected source
//! first (`estimate`).

pub mod stats;
mod dispersion;
mod trend;
mod valuation;

pub use dispersion::{
    DEFAULT_LOOKBACK_DAYS, DispersionEstimator, DispersionResult, FALLBACK_MEAN, FALLBACK_STD_DEV,
    ZScoreMethod, z_score,
};
pub use trend::{TREND_WINDOW, TrendEstimator, TrendResult, UPPER_BAND_MULTIPLE, classify};
pub use valuation::{
    FAIR_VALUE_OFFSET, FAIR_VALUE_SLOPE, VALUATION_WINDOW, ValuationEstimator, ValuationResult,
    age_in_days, fair_value, genesis_date,
};
