//! Decision Engine
//!
//! Maps a [`MarketSnapshot`] to a [`TradeSignal`] through a strict priority
//! cascade. The first stage that applies wins:
//!
//! ```text
//! 1. Leverage breaker   leverage > 1.5               -> HALT / HALT
//! 2. Top-signal breaker Pi cross or above 5x 2y MA   -> SELL_ALERT / SELL_ALERT
//! 3. Valuation zone     index vs 0.45 / 1.20 / 5.00  -> STRONG_BUY | DCA_BUY | HOLD | SELL
//!    a. overheat        buying zone and MVRV-Z > 6.0 -> HOLD_CAUTION
//!    b. ETH sub-strategy from the band position and whether buying survived
//! ```
//!
//! Evaluation is pure: no clock, no I/O, no shared state. The report date
//! comes from the snapshot timestamp.

use crate::model::{BandPosition, BtcAction, EthAction, MarketSnapshot, TradeSignal, TrendZone};
use crate::report;

/// Leverage above which every action is halted
pub const MAX_LEVERAGE: f64 = 1.5;

/// Valuation index below this is the bottom-fishing zone
pub const STRONG_BUY_BELOW: f64 = 0.45;

/// Valuation index below this (and at least [`STRONG_BUY_BELOW`]) is the DCA zone
pub const DCA_BELOW: f64 = 1.20;

/// Valuation index below this (and at least [`DCA_BELOW`]) is the hold zone
pub const HOLD_BELOW: f64 = 5.00;

/// MVRV Z-score above which buying is suspended
pub const OVERHEAT_Z: f64 = 6.0;

/// Base zone picked from the valuation index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValuationZone {
    StrongBuy,
    DcaBuy,
    Hold,
    Sell,
}

impl ValuationZone {
    /// Lower bounds are inclusive: 0.45 is DCA, 1.20 is hold, 5.00 is sell.
    /// A NaN index falls through to `Sell`.
    pub fn classify(index: f64) -> Self {
        if index < STRONG_BUY_BELOW {
            Self::StrongBuy
        } else if index < DCA_BELOW {
            Self::DcaBuy
        } else if index < HOLD_BELOW {
            Self::Hold
        } else {
            Self::Sell
        }
    }

    pub const fn amount_factor(self) -> f64 {
        match self {
            Self::StrongBuy => 1.5,
            Self::DcaBuy => 1.0,
            Self::Hold | Self::Sell => 0.0,
        }
    }

    pub const fn allows_buying(self) -> bool {
        matches!(self, Self::StrongBuy | Self::DcaBuy)
    }

    pub const fn action(self) -> BtcAction {
        match self {
            Self::StrongBuy => BtcAction::StrongBuy,
            Self::DcaBuy => BtcAction::DcaBuy,
            Self::Hold => BtcAction::Hold,
            Self::Sell => BtcAction::Sell,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "🟢 Bottom zone",
            Self::DcaBuy => "🔵 DCA zone",
            Self::Hold => "🟡 Hold zone",
            Self::Sell => "🔴 Sell zone",
        }
    }
}

/// The priority stage that governs a snapshot
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Stage {
    LeverageBreach { leverage: f64 },
    TopSignal {
        trend_cross: bool,
        trend_zone: TrendZone,
    },
    ZoneBased(ValuationZone),
}

impl Stage {
    pub const fn is_circuit_breaker(&self) -> bool {
        !matches!(self, Self::ZoneBased(_))
    }
}

/// Pick the governing stage. Circuit breakers are checked in priority order.
pub fn classify(snapshot: &MarketSnapshot) -> Stage {
    if snapshot.account_leverage > MAX_LEVERAGE {
        return Stage::LeverageBreach {
            leverage: snapshot.account_leverage,
        };
    }

    if snapshot.trend_cross || snapshot.trend_zone == TrendZone::AboveUpperBand {
        return Stage::TopSignal {
            trend_cross: snapshot.trend_cross,
            trend_zone: snapshot.trend_zone,
        };
    }

    Stage::ZoneBased(ValuationZone::classify(snapshot.valuation_index))
}

/// Actions decided for one snapshot, before the report is rendered
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub stage: Stage,
    pub action_btc: BtcAction,
    pub action_eth: EthAction,
    pub amount_factor: f64,
    pub warning: Option<String>,
    pub is_halted: bool,

    /// Buying survived every override
    pub buying_allowed: bool,
}

impl Decision {
    fn halted(stage: Stage, action_btc: BtcAction, action_eth: EthAction, warning: String) -> Self {
        Self {
            stage,
            action_btc,
            action_eth,
            amount_factor: 0.0,
            warning: Some(warning),
            is_halted: true,
            buying_allowed: false,
        }
    }

    pub fn into_signal(self, report: String) -> TradeSignal {
        TradeSignal {
            action_btc: self.action_btc,
            action_eth: self.action_eth,
            amount_factor: self.amount_factor,
            warning: self.warning,
            is_halted: self.is_halted,
            report,
        }
    }
}

/// ETH sub-strategy. Only the buying-allowed flag links it to BTC.
pub const fn eth_action(band: BandPosition, buying_allowed: bool) -> EthAction {
    match band {
        BandPosition::Lower if buying_allowed => EthAction::BuyHeavy,
        BandPosition::Upper => EthAction::SellOrSwap,
        BandPosition::Lower | BandPosition::Middle => EthAction::FollowBtc,
    }
}

/// Run the cascade without rendering
pub fn decide(snapshot: &MarketSnapshot) -> Decision {
    let stage = classify(snapshot);

    match stage {
        Stage::LeverageBreach { leverage } => Decision::halted(
            stage,
            BtcAction::Halt,
            EthAction::Halt,
            format!(
                "⚠️ Leverage too high ({leverage:.2}x > {MAX_LEVERAGE:.1}x)! Stop buying and top up margin!"
            ),
        ),
        Stage::TopSignal { .. } => Decision::halted(
            stage,
            BtcAction::SellAlert,
            EthAction::SellAlert,
            "🚨 Top signal triggered! Pi-cycle cross or price above 5x the two-year MA. No buying!"
                .into(),
        ),
        Stage::ZoneBased(zone) => {
            let overheated = zone.allows_buying() && snapshot.dispersion_z > OVERHEAT_Z;

            let (action_btc, amount_factor, warning, buying_allowed) = if overheated {
                (
                    BtcAction::HoldCaution,
                    0.0,
                    Some(format!(
                        "⚠️ MVRV Z-Score ({:.2}) is extremely overheated, buying paused!",
                        snapshot.dispersion_z
                    )),
                    false,
                )
            } else {
                (zone.action(), zone.amount_factor(), None, zone.allows_buying())
            };

            Decision {
                stage,
                action_btc,
                action_eth: eth_action(snapshot.eth_band, buying_allowed),
                amount_factor,
                warning,
                is_halted: false,
                buying_allowed,
            }
        }
    }
}

/// Evaluate a snapshot into a fresh trade signal with its markdown report
pub fn evaluate(snapshot: &MarketSnapshot) -> TradeSignal {
    let decision = decide(snapshot);
    let body = report::render(snapshot, &decision);

    tracing::debug!(
        btc = %decision.action_btc,
        eth = %decision.action_eth,
        amount_factor = decision.amount_factor,
        halted = decision.is_halted,
        "Snapshot evaluated"
    );

    decision.into_signal(body)
}
