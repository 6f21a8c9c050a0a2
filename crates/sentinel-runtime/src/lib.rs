//! # sentinel-runtime
//!
//! Concrete collaborators for the sentinel pipeline.
//!
//! ## Integrations
//!
//! - **Binance**: daily closes for the valuation and trend estimators
//! - **CoinMetrics**: daily MVRV history for the dispersion estimator
//! - **Telegram**: report delivery with retry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sentinel_runtime::{BinanceConfig, BinanceKlineSource, CoinMetricsConfig, CoinMetricsSource};
//!
//! let prices = Arc::new(BinanceKlineSource::new(BinanceConfig::default())?);
//! let ratios = Arc::new(CoinMetricsSource::new(CoinMetricsConfig::default())?);
//! let report = IndicatorAggregator::new(prices, ratios).collect(&signals).await?;
//! ```

pub mod binance;
pub mod coinmetrics;
pub mod error;
pub mod http;
pub mod notify;

pub use binance::{BinanceConfig, BinanceKlineSource};
pub use coinmetrics::{CoinMetricsConfig, CoinMetricsSource};
pub use error::{Result, RuntimeError};
pub use http::HttpConfig;
pub use notify::{
    LogNotifier, Notifier, RetryPolicy, TelegramConfig, TelegramNotifier, send_with_retry,
};
