//! Periodic Evaluation
//!
//! One cycle: collect indicators, evaluate, render, deliver. A failed
//! collection still delivers something: a short notice naming the cause.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;
use uuid::Uuid;

use sentinel_core::SentinelError;
use sentinel_runtime::{RuntimeError, send_with_retry};

use crate::state::AppState;

/// Text delivered when no report could be produced
pub fn failure_notice(err: &SentinelError) -> String {
    format!("❌ **CryptoSentinel** could not evaluate this week's signal.\n\nCause: {err}")
}

/// Run one evaluation and deliver the outcome
pub async fn run_cycle(state: &AppState) -> Result<(), RuntimeError> {
    let text = match state.evaluate_live().await {
        Ok((_, signal)) => {
            tracing::info!(
                "BTC {} / ETH {} (x{:.1}, halted: {})",
                signal.action_btc,
                signal.action_eth,
                signal.amount_factor,
                signal.is_halted
            );
            signal.report
        }
        Err(e) => {
            tracing::error!("Evaluation failed: {}", e);
            failure_notice(&e)
        }
    };

    send_with_retry(state.notifier.as_ref(), &text, state.retry).await?;
    tracing::info!("Delivered via {}", state.notifier.name());
    Ok(())
}

/// Run cycles every `period` until the task is dropped
///
/// The first cycle waits a full period unless `run_on_start` is set.
pub fn spawn(state: AppState, period: Duration, run_on_start: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // interval fires immediately on the first tick
        if !run_on_start {
            ticker.tick().await;
        }

        loop {
            ticker.tick().await;

            let span = tracing::info_span!("cycle", run_id = %Uuid::new_v4());
            if let Err(e) = run_cycle(&state).instrument(span).await {
                tracing::error!("Report delivery failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use sentinel_core::source::{StaticPriceSource, StaticRatioSource};
    use sentinel_core::{ExternalSignals, IndicatorAggregator};
    use sentinel_runtime::{Notifier, RetryPolicy};

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn send(&self, text: &str) -> sentinel_runtime::Result<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "Recorder"
        }
    }

    fn state(
        prices: StaticPriceSource,
        notifier: Arc<Recorder>,
        signals: ExternalSignals,
    ) -> AppState {
        AppState {
            aggregator: Arc::new(IndicatorAggregator::new(
                Arc::new(prices),
                Arc::new(StaticRatioSource::new(vec![2.5, 1.0, 2.0, 1.5])),
            )),
            notifier,
            signals,
            retry: RetryPolicy {
                attempts: 1,
                base_delay: Duration::from_millis(1),
            },
        }
    }

    #[tokio::test]
    async fn test_cycle_delivers_report() {
        let recorder = Arc::new(Recorder::default());
        let prices = StaticPriceSource::new()
            .with_constant("BTCUSDT", 60_000.0, 800)
            .with_constant("ETHUSDT", 3_000.0, 10);

        run_cycle(&state(prices, recorder.clone(), ExternalSignals::default()))
            .await
            .unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("CryptoSentinel Weekly Report"));
        assert!(sent[0].contains("Valuation details"));
    }

    #[tokio::test]
    async fn test_cycle_reports_halt() {
        let recorder = Arc::new(Recorder::default());
        let prices = StaticPriceSource::new().with_constant("BTCUSDT", 60_000.0, 800);
        let signals = ExternalSignals {
            account_leverage: 2.0,
            ..ExternalSignals::default()
        };

        run_cycle(&state(prices, recorder.clone(), signals)).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert!(sent[0].contains("Leverage too high"));
    }

    #[tokio::test]
    async fn test_failed_collection_sends_notice() {
        let recorder = Arc::new(Recorder::default());

        run_cycle(&state(StaticPriceSource::new(), recorder.clone(), ExternalSignals::default()))
            .await
            .unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("❌"));
        assert!(sent[0].contains("Insufficient data"));
    }
}
