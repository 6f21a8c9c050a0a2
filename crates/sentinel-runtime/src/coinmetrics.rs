//! CoinMetrics Community API
//!
//! `RatioHistorySource` serving daily BTC MVRV (`CapMVRVCur`) samples.
//! The API pages oldest-first; rows are re-ordered newest-first here.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use sentinel_core::SentinelError;
use sentinel_core::source::{RatioHistorySource, parse_samples};

use crate::error::{Result, RuntimeError};
use crate::http::HttpConfig;

/// Largest page the community API serves
pub const MAX_PAGE_SIZE: usize = 10_000;

#[derive(Clone, Debug)]
pub struct CoinMetricsConfig {
    pub base_url: String,
    pub asset: String,
    pub metric: String,
    pub http: HttpConfig,
}

impl Default for CoinMetricsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://community-api.coinmetrics.io/v4".into(),
            asset: "btc".into(),
            metric: "CapMVRVCur".into(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    data: Vec<MetricRow>,
}

#[derive(Debug, Deserialize)]
struct MetricRow {
    time: String,

    #[serde(flatten)]
    fields: HashMap<String, Value>,
}

pub struct CoinMetricsSource {
    client: Client,
    config: CoinMetricsConfig,
}

impl CoinMetricsSource {
    pub fn new(config: CoinMetricsConfig) -> Result<Self> {
        Ok(Self {
            client: config.http.build_client()?,
            config,
        })
    }

    fn metrics_url(&self, page_size: usize) -> String {
        format!(
            "{}/timeseries/asset-metrics?assets={}&metrics={}&frequency=1d&page_size={}&paging_from=end",
            self.config.base_url.trim_end_matches('/'),
            self.config.asset,
            self.config.metric,
            page_size.clamp(1, MAX_PAGE_SIZE)
        )
    }

    async fn fetch_body(&self, page_size: usize) -> Result<String> {
        let url = self.metrics_url(page_size);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RuntimeError::Status {
                service: "coinmetrics",
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Metric samples from a timeseries payload, most recent first.
///
/// Rows with an unparsable timestamp or value are skipped.
pub fn parse_ratios(body: &str, metric: &str) -> sentinel_core::Result<Vec<f64>> {
    let response: TimeseriesResponse = serde_json::from_str(body)?;

    let mut rows: Vec<(DateTime<Utc>, String)> = response
        .data
        .iter()
        .filter_map(|row| {
            let Ok(time) = DateTime::parse_from_rfc3339(&row.time) else {
                tracing::debug!("Skipping {} row with bad time '{}'", metric, row.time);
                return None;
            };
            let raw = row.fields.get(metric).map(field_text).unwrap_or_default();
            Some((time.with_timezone(&Utc), raw))
        })
        .collect();

    if rows.is_empty() {
        return Err(SentinelError::EmptyData(format!("no {metric} rows")));
    }

    rows.sort_by(|a, b| b.0.cmp(&a.0));
    parse_samples(rows.iter().map(|(_, raw)| raw.as_str()), metric)
}

#[async_trait]
impl RatioHistorySource for CoinMetricsSource {
    async fn fetch_ratios(&self, lookback: usize) -> sentinel_core::Result<Vec<f64>> {
        let body = self.fetch_body(lookback).await?;
        let samples = parse_ratios(&body, &self.config.metric)?;
        tracing::debug!("CoinMetrics returned {} {} samples", samples.len(), self.config.metric);
        Ok(samples)
    }

    fn name(&self) -> &str {
        "CoinMetrics"
    }
}
