//! Application State

use std::sync::Arc;

use sentinel_core::{ExternalSignals, IndicatorAggregator, IndicatorReport, TradeSignal};
use sentinel_core::report::render_details;
use sentinel_runtime::{Notifier, RetryPolicy};

/// Shared by the HTTP handlers and the scheduler
#[derive(Clone)]
pub struct AppState {
    /// Indicator collection over the configured sources
    pub aggregator: Arc<IndicatorAggregator>,

    /// Where scheduled reports go (Telegram or the log)
    pub notifier: Arc<dyn Notifier>,

    /// Leverage, top cross and ETH band fed into every snapshot
    pub signals: ExternalSignals,

    pub retry: RetryPolicy,
}

impl AppState {
    /// Collect live indicators and evaluate them, details appended to the report
    pub async fn evaluate_live(&self) -> sentinel_core::Result<(IndicatorReport, TradeSignal)> {
        let report = self.aggregator.collect(&self.signals).await?;
        let mut signal = sentinel_core::evaluate(&report.snapshot);
        signal.report.push_str(&render_details(&report));
        Ok((report, signal))
    }
}
