//! Valuation Index Estimator
//!
//! Combines a 200-day geometric-mean cost basis with a power-law fair value
//! curve fitted on coin age:
//!
//! ```text
//! cost_basis = exp(mean(ln p))                       over the window
//! fair_value = 10 ^ (5.84 * log10(age_days) - 17.01)
//! index      = (price / cost_basis) * (price / fair_value)
//! ```
//!
//! Below 0.45 the market is historically cheap; above 5.00 it is expensive.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::stats;
use crate::error::{Result, SentinelError};
use crate::model::PriceSeries;
use crate::source::PriceHistorySource;

/// Closes in the cost-basis window
pub const VALUATION_WINDOW: usize = 200;

/// Power-law slope on `log10(age_days)`
pub const FAIR_VALUE_SLOPE: f64 = 5.84;

/// Power-law offset subtracted from the exponent
pub const FAIR_VALUE_OFFSET: f64 = 17.01;

/// BTC genesis block date (2009-01-03 UTC)
pub fn genesis_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2009, 1, 3, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Whole days elapsed since `origin`, rounded down
pub fn age_in_days(origin: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - origin).num_hours().div_euclid(24)
}

/// Power-law fair value for a coin age; zero for non-positive ages
pub fn fair_value(age_days: i64) -> f64 {
    if age_days <= 0 {
        return 0.0;
    }
    let exponent = FAIR_VALUE_SLOPE.mul_add((age_days as f64).log10(), -FAIR_VALUE_OFFSET);
    10f64.powf(exponent)
}

/// Result of one valuation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Most recent close in the window
    pub current_price: f64,

    /// Geometric mean of the window (the DCA cost basis)
    pub cost_basis: f64,

    /// Power-law fair value at this coin age
    pub fair_value: f64,

    /// Final valuation index
    pub index: f64,

    pub age_in_days: i64,

    pub computed_at: DateTime<Utc>,
}

/// Estimator configuration
#[derive(Clone, Debug)]
pub struct ValuationEstimator {
    symbol: String,
    window: usize,
    origin: DateTime<Utc>,
}

impl Default for ValuationEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationEstimator {
    /// BTCUSDT over 200 days, aged from the genesis block
    pub fn new() -> Self {
        Self {
            symbol: "BTCUSDT".into(),
            window: VALUATION_WINDOW,
            origin: genesis_date(),
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub const fn window(&self) -> usize {
        self.window
    }

    /// Compute the index from closes already in hand.
    ///
    /// Uses the most recent `window` closes. Fails with `InsufficientData`
    /// when fewer are supplied and with `MalformedSample` when the latest
    /// close is not a positive price. Earlier non-positive closes are skipped.
    pub fn compute(&self, series: &PriceSeries, now: DateTime<Utc>) -> Result<ValuationResult> {
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

        let cost_basis = stats::geometric_mean(window).ok_or_else(|| {
            SentinelError::EmptyData(format!("no positive closes for {}", series.symbol))
        })?;

        let age = age_in_days(self.origin, now);
        let fair = fair_value(age);
        let index = (current_price / cost_basis) * (current_price / fair);

        tracing::debug!(
            symbol = %series.symbol,
            current_price,
            cost_basis,
            fair_value = fair,
            age,
            index,
            "Valuation index computed"
        );

        Ok(ValuationResult {
            current_price,
            cost_basis,
            fair_value: fair,
            index,
            age_in_days: age,
            computed_at: now,
        })
    }

    /// Fetch the window from `source` and compute the index.
    ///
    /// Transport failures surface as `InsufficientData` with zero rows.
    pub async fn estimate(&self, source: &dyn PriceHistorySource) -> Result<ValuationResult> {
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
