//! # sentinel-core
//!
//! Market indicators and a rule-based decision engine for a conservative
//! BTC/ETH accumulation strategy.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌─────────────────────────────┐   ┌────────────┐   ┌──────────┐
//! │ Price source │──▶│ Valuation  (200d, power law)│──▶│            │   │          │
//! │              │──▶│ Trend      (730d MA x5)     │──▶│ Aggregator │──▶│  Engine  │──▶ TradeSignal
//! │ Ratio source │──▶│ Dispersion (MVRV Z-score)   │──▶│            │   │          │
//! └──────────────┘   └─────────────────────────────┘   └────────────┘   └──────────┘
//!                               leverage, Pi cross, ETH band ──▶┘
//! ```
//!
//! Everything downstream of the sources is a pure function of its inputs.
//! The engine in particular never fails and never looks at the clock.
//!
//! ## Decision priorities
//!
//! 1. Leverage above 1.5x halts everything
//! 2. A Pi-cycle cross or price above 5x the two-year MA raises a top alert
//! 3. The valuation index picks the base zone, which an overheated MVRV-Z
//!    can downgrade, and ETH follows its own band position

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod model;
pub mod report;
pub mod source;

pub use aggregator::{ExternalSignals, IndicatorAggregator, IndicatorReport};
pub use engine::{Decision, Stage, ValuationZone, decide, evaluate};
pub use error::{Result, SentinelError};
pub use model::{
    BandPosition, BtcAction, EthAction, MarketSnapshot, PriceSeries, TradeSignal, TrendZone,
};
pub use source::{PriceHistorySource, RatioHistorySource};
