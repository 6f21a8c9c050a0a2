//! Markdown Report Rendering
//!
//! Turns a decision into the weekly report text. The header date comes from
//! the snapshot, so rendering the same snapshot twice gives the same text.

use crate::aggregator::IndicatorReport;
use crate::engine::{Decision, MAX_LEVERAGE, ValuationZone};
use crate::indicators::{TREND_WINDOW, VALUATION_WINDOW};
use crate::model::MarketSnapshot;

/// Leverage above this is shown as a caution
pub const LEVERAGE_CAUTION: f64 = 1.2;

fn leverage_status(leverage: f64) -> &'static str {
    if leverage > MAX_LEVERAGE {
        "❌ Danger"
    } else if leverage > LEVERAGE_CAUTION {
        "⚠️ Caution"
    } else {
        "✅ Safe"
    }
}

const fn cross_status(cross: bool) -> &'static str {
    if cross { "❌ Crossed" } else { "✅ Normal" }
}

/// Render the markdown report for one decision
pub fn render(snapshot: &MarketSnapshot, decision: &Decision) -> String {
    let mut s = String::new();

    s.push_str(&format!(
        "🛡️ **CryptoSentinel Weekly Report** [{}]\n",
        snapshot.timestamp.format("%Y-%m-%d")
    ));

    if let Some(warning) = &decision.warning {
        s.push_str(&format!("\n⚠️ **Warning**: {warning}\n"));
    }

    s.push_str("\n**1. Risk checks**\n");
    s.push_str(&format!(
        "- Leverage: {:.2}x ({})\n",
        snapshot.account_leverage,
        leverage_status(snapshot.account_leverage)
    ));
    s.push_str(&format!(
        "- Top signals: Pi cycle [{}] / 2y MA [{}]\n",
        cross_status(snapshot.trend_cross),
        snapshot.trend_zone
    ));

    s.push_str("\n**2. Core indicators**\n");
    s.push_str(&format!(
        "- 📏 Valuation index: {:.4} -> {}\n",
        snapshot.valuation_index,
        ValuationZone::classify(snapshot.valuation_index).label()
    ));
    s.push_str(&format!("- 🌡️ MVRV-Z: {:.2}\n", snapshot.dispersion_z));
    s.push_str(&format!("- 💎 ETH band: {}\n", snapshot.eth_band.label()));

    s.push_str("\n**3. Recommendation**\n");
    s.push_str(&format!("- 🚀 **BTC action**: {}\n", decision.action_btc.description()));
    s.push_str(&format!("- 💰 **Amount factor**: {:.1}x\n", decision.amount_factor));
    s.push_str(&format!("- Ξ **ETH action**: {}\n", decision.action_eth.description()));

    s.push_str(&format!("\n_Source: {}_", snapshot.source));

    s
}

/// Calculation details appended below the report
pub fn render_details(report: &IndicatorReport) -> String {
    let mut s = String::new();
    let valuation = &report.valuation;

    s.push_str("\n\n📊 *Valuation details*\n");
    s.push_str(&format!("- {VALUATION_WINDOW}-day cost basis: ${:.0}\n", valuation.cost_basis));
    s.push_str(&format!("- Coin age: {} days\n", valuation.age_in_days));
    s.push_str(&format!("- Power-law fair value: ${:.0}\n", valuation.fair_value));

    match &report.trend {
        Some(trend) => {
            s.push_str("\n📐 *Two-year MA multiplier*\n");
            s.push_str(&format!("- {TREND_WINDOW}-day MA: ${:.0}\n", trend.moving_average));
            s.push_str(&format!("- Top line (5x): ${:.0}\n", trend.upper_band));
            s.push_str(&format!("- Current multiple: {:.2}x\n", trend.multiple));
        }
        None => s.push_str("\n📐 *Two-year MA multiplier*: unavailable (neutral zone assumed)\n"),
    }

    match &report.dispersion {
        Some(dispersion) => {
            s.push_str("\n🌡️ *MVRV*\n");
            s.push_str(&format!("- Ratio: {:.4}\n", dispersion.current_ratio));
            s.push_str(&format!("- Z-score basis: {}\n", dispersion.source));
            if dispersion.is_degraded() {
                s.push_str("- ⚠️ Degraded precision: approximate constants, not history\n");
            }
        }
        None => s.push_str("\n🌡️ *MVRV*: unavailable (neutral Z-score assumed)\n"),
    }

    s
}
