//! HTTP Handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use sentinel_core::{MarketSnapshot, TradeSignal};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub notifier: String,
}

#[derive(Debug, Serialize)]
pub struct SignalResponse {
    pub snapshot: MarketSnapshot,
    pub signal: TradeSignal,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        notifier: state.notifier.name().to_string(),
    })
}

/// Evaluate a caller-supplied snapshot
///
/// A body missing any snapshot field is rejected by the extractor.
pub async fn evaluate_handler(Json(snapshot): Json<MarketSnapshot>) -> Json<TradeSignal> {
    Json(sentinel_core::evaluate(&snapshot))
}

/// Collect live indicators and evaluate them
pub async fn signal_handler(
    State(state): State<AppState>,
) -> Result<Json<SignalResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (report, signal) = state.evaluate_live().await.map_err(|e| {
        tracing::error!("Indicator collection failed: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "COLLECTION_FAILED".into(),
            }),
        )
    })?;

    Ok(Json(SignalResponse {
        snapshot: report.snapshot,
        signal,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use sentinel_core::source::{StaticPriceSource, StaticRatioSource};
    use sentinel_core::{BandPosition, BtcAction, ExternalSignals, IndicatorAggregator, TrendZone};
    use sentinel_runtime::{LogNotifier, RetryPolicy};

    fn state(prices: StaticPriceSource) -> AppState {
        AppState {
            aggregator: Arc::new(IndicatorAggregator::new(
                Arc::new(prices),
                Arc::new(StaticRatioSource::new(vec![2.0, 1.0, 3.0])),
            )),
            notifier: Arc::new(LogNotifier),
            signals: ExternalSignals::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health_check(State(state(StaticPriceSource::new()))).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.notifier, "Log");
    }

    #[tokio::test]
    async fn test_evaluate_snapshot() {
        let snapshot = MarketSnapshot {
            price_btc: 95_000.0,
            price_eth: 3_400.0,
            valuation_index: 0.8,
            dispersion_z: 1.2,
            trend_zone: TrendZone::Normal,
            trend_cross: false,
            eth_band: BandPosition::Middle,
            account_leverage: 1.0,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap(),
            source: "manual".into(),
        };

        let Json(signal) = evaluate_handler(Json(snapshot)).await;
        assert_eq!(signal.action_btc, BtcAction::DcaBuy);
        assert!(signal.report.contains("2025-01-06"));
    }

    #[tokio::test]
    async fn test_signal_unavailable_without_prices() {
        let (status, Json(body)) = signal_handler(State(state(StaticPriceSource::new())))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "COLLECTION_FAILED");
    }

    #[tokio::test]
    async fn test_signal_with_live_sources() {
        let prices = StaticPriceSource::new()
            .with_constant("BTCUSDT", 60_000.0, 800)
            .with_constant("ETHUSDT", 3_000.0, 10);

        let Json(response) = signal_handler(State(state(prices))).await.unwrap();
        assert!((response.snapshot.price_eth - 3_000.0).abs() < f64::EPSILON);
        assert!(response.signal.report.contains("Valuation details"));
    }
}
