//! crypto-sentinel Server
//!
//! Runs the weekly evaluation on a timer and exposes the engine over a
//! small REST API.

mod config;
mod handlers;
mod scheduler;
mod state;

use std::sync::Arc;

use axum::{routing::{get, post}, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_core::IndicatorAggregator;
use sentinel_runtime::{
    BinanceConfig, BinanceKlineSource, CoinMetricsConfig, CoinMetricsSource, HttpConfig,
    LogNotifier, Notifier, RetryPolicy, TelegramConfig, TelegramNotifier,
};

use crate::config::SentinelConfig;
use crate::handlers::{evaluate_handler, health_check, signal_handler};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env reaches the filter
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SentinelConfig::from_env()?;

    let http = HttpConfig::default().with_proxy(config.proxy.clone());
    if let Some(proxy) = &config.proxy {
        tracing::info!("Routing outbound requests via {}", proxy);
    }

    // Data sources
    let prices = Arc::new(BinanceKlineSource::new(BinanceConfig {
        base_url: config.binance_base_url.clone(),
        http: http.clone(),
        ..BinanceConfig::default()
    })?);
    let ratios = Arc::new(CoinMetricsSource::new(CoinMetricsConfig {
        base_url: config.coinmetrics_base_url.clone(),
        http: http.clone(),
        ..CoinMetricsConfig::default()
    })?);

    let aggregator = IndicatorAggregator::new(prices, ratios)
        .with_dispersion_lookback(config.dispersion_lookback)
        .with_fallback(config.dispersion_fallback);

    // Delivery
    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(creds) => {
            tracing::info!("✓ Telegram delivery configured");
            Arc::new(TelegramNotifier::new(TelegramConfig {
                http,
                ..TelegramConfig::new(&creds.bot_token, &creds.chat_id)
            })?)
        }
        None => {
            tracing::warn!("⚠ Telegram not configured - reports go to the log");
            tracing::warn!("  Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID in .env");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState {
        aggregator: Arc::new(aggregator),
        notifier,
        signals: config.signals.clone(),
        retry: RetryPolicy {
            attempts: config.delivery_retries,
            ..RetryPolicy::default()
        },
    };

    let _scheduler = scheduler::spawn(state.clone(), config.schedule_interval, config.run_on_start);
    tracing::info!(
        "Evaluating every {}s (run on start: {})",
        config.schedule_interval.as_secs(),
        config.run_on_start
    );

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/evaluate", post(evaluate_handler))
        .route("/api/signal", get(signal_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🛡️ crypto-sentinel running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health        - Health check");
    tracing::info!("  POST /api/evaluate  - Evaluate a market snapshot");
    tracing::info!("  GET  /api/signal    - Evaluate live indicators");

    axum::serve(listener, app).await?;

    Ok(())
}
