//! Domain Models
//!
//! Value types shared by the estimators, the decision engine and the
//! report renderer. Every type here is immutable once built; nothing is
//! carried over between evaluations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SentinelError;

/// Daily closing prices for one symbol, oldest first
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Exchange symbol (e.g., "BTCUSDT")
    pub symbol: String,

    /// Chronological closes; the last entry is the current day
    pub closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, closes: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            closes,
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Most recent close
    pub fn latest(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// The most recent `n` closes (the whole series when shorter)
    pub fn tail(&self, n: usize) -> &[f64] {
        &self.closes[self.closes.len().saturating_sub(n)..]
    }
}

/// Where BTC trades relative to its two-year moving average
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendZone {
    /// Between the moving average and five times the moving average
    #[default]
    Normal,

    /// Below the moving average (bear market bottom)
    BelowBand,

    /// Above five times the moving average (blow-off top)
    AboveUpperBand,
}

impl TrendZone {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::BelowBand => "Below MA (bottom zone)",
            Self::AboveUpperBand => "Above 5x MA (top zone)",
        }
    }
}

impl fmt::Display for TrendZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// ETH position inside its logarithmic regression channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandPosition {
    /// Under the channel (undervalued)
    Lower,

    #[default]
    Middle,

    /// Over the channel (overvalued)
    Upper,
}

impl BandPosition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lower => "🟢 Lower band (undervalued)",
            Self::Middle => "🟡 Middle band",
            Self::Upper => "🔴 Upper band (overvalued)",
        }
    }
}

impl FromStr for BandPosition {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lower" => Ok(Self::Lower),
            "middle" => Ok(Self::Middle),
            "upper" => Ok(Self::Upper),
            other => Err(SentinelError::Config(format!(
                "unknown band position '{other}' (expected lower, middle or upper)"
            ))),
        }
    }
}

/// Recommended action for the primary asset (BTC)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BtcAction {
    Halt,
    SellAlert,
    StrongBuy,
    DcaBuy,
    Hold,
    HoldCaution,
    Sell,
}

impl BtcAction {
    /// Stable identifier for automation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Halt => "HALT",
            Self::SellAlert => "SELL_ALERT",
            Self::StrongBuy => "STRONG_BUY",
            Self::DcaBuy => "DCA_BUY",
            Self::Hold => "HOLD",
            Self::HoldCaution => "HOLD_CAUTION",
            Self::Sell => "SELL",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Halt => "🛑 Halted by circuit breaker",
            Self::SellAlert => "🚨 Top alert",
            Self::StrongBuy => "💪 Greedy buy",
            Self::DcaBuy => "📈 Regular DCA",
            Self::Hold => "✋ Hold and watch",
            Self::HoldCaution => "⚠️ Hold with caution",
            Self::Sell => "📉 Scale out",
        }
    }
}

impl fmt::Display for BtcAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended action for the secondary asset (ETH)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EthAction {
    Halt,
    SellAlert,
    BuyHeavy,
    #[serde(rename = "SELL_OR_SWAP_BTC")]
    SellOrSwap,
    #[serde(rename = "FOLLOW_BTC")]
    FollowBtc,
}

impl EthAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Halt => "HALT",
            Self::SellAlert => "SELL_ALERT",
            Self::BuyHeavy => "BUY_HEAVY",
            Self::SellOrSwap => "SELL_OR_SWAP_BTC",
            Self::FollowBtc => "FOLLOW_BTC",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Halt => "🛑 Halted by circuit breaker",
            Self::SellAlert => "🚨 Top alert",
            Self::BuyHeavy => "💪 Heavy buy",
            Self::SellOrSwap => "🔄 Sell or swap into BTC",
            Self::FollowBtc => "👉 Follow BTC",
        }
    }
}

impl fmt::Display for EthAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time input to the decision engine
///
/// Every field is mandatory. Callers fill unavailable metrics with a
/// neutral default instead of leaving them out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Current BTC price (USD)
    pub price_btc: f64,

    /// Current ETH price (USD)
    pub price_eth: f64,

    /// Valuation index: < 0.45 bottom, 0.45-1.20 DCA, 1.20-5.00 hold, >= 5.00 sell
    pub valuation_index: f64,

    /// MVRV Z-score; above 6.0 the market is overheated
    pub dispersion_z: f64,

    /// Two-year moving average zone
    pub trend_zone: TrendZone,

    /// Pi-cycle top cross observed
    pub trend_cross: bool,

    /// ETH regression band position
    pub eth_band: BandPosition,

    /// Effective account leverage
    pub account_leverage: f64,

    /// When the inputs were gathered
    pub timestamp: DateTime<Utc>,

    /// Human-readable description of the data sources
    pub source: String,
}

/// The engine's output for one snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub action_btc: BtcAction,

    pub action_eth: EthAction,

    /// Multiplier applied to the regular DCA amount (never negative)
    pub amount_factor: f64,

    /// Warning shown ahead of the report, if any
    pub warning: Option<String>,

    /// A circuit breaker fired and all buying is suspended
    pub is_halted: bool,

    /// Markdown report
    pub report: String,
}

impl TradeSignal {
    pub const fn has_warning(&self) -> bool {
        self.warning.is_some()
    }
}
