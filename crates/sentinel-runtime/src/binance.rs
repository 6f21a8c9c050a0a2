//! Binance Daily Klines
//!
//! `PriceHistorySource` backed by the public `/api/v3/klines` endpoint.
//! Each row is `[open_time, open, high, low, close, volume, ...]` with
//! prices encoded as strings; only the close (index 4) is kept.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use sentinel_core::model::PriceSeries;
use sentinel_core::source::{PriceHistorySource, parse_sample};

use crate::error::{Result, RuntimeError};
use crate::http::HttpConfig;

/// Largest `limit` Binance accepts per klines request
pub const MAX_KLINE_LIMIT: usize = 1000;

const CLOSE_INDEX: usize = 4;

#[derive(Clone, Debug)]
pub struct BinanceConfig {
    pub base_url: String,

    /// Kline interval; the estimators expect daily bars
    pub interval: String,

    pub http: HttpConfig,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".into(),
            interval: "1d".into(),
            http: HttpConfig::default(),
        }
    }
}

pub struct BinanceKlineSource {
    client: Client,
    config: BinanceConfig,
}

impl BinanceKlineSource {
    pub fn new(config: BinanceConfig) -> Result<Self> {
        Ok(Self {
            client: config.http.build_client()?,
            config,
        })
    }

    fn klines_url(&self, symbol: &str, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.config.base_url.trim_end_matches('/'),
            symbol.to_uppercase(),
            self.config.interval,
            limit.clamp(1, MAX_KLINE_LIMIT)
        )
    }

    /// Fetch up to `limit` closes, oldest first
    pub async fn fetch_klines(&self, symbol: &str, limit: usize) -> Result<PriceSeries> {
        let url = self.klines_url(symbol, limit);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RuntimeError::Status {
                service: "binance",
                status: status.as_u16(),
                body,
            });
        }

        let series = parse_klines(symbol, &body)?;
        if series.len() < limit {
            tracing::warn!("Binance returned {} of {} {} klines", series.len(), limit, symbol);
        }
        Ok(series)
    }
}

/// Extract closes from a klines payload, skipping short or malformed rows
pub fn parse_klines(symbol: &str, body: &str) -> Result<PriceSeries> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;

    let closes = rows
        .iter()
        .filter_map(|row| {
            let raw = row.get(CLOSE_INDEX)?.as_str()?;
            match parse_sample(raw) {
                Ok(close) => Some(close),
                Err(e) => {
                    tracing::debug!("Skipping {} kline: {}", symbol, e);
                    None
                }
            }
        })
        .collect();

    Ok(PriceSeries::new(symbol, closes))
}

#[async_trait]
impl PriceHistorySource for BinanceKlineSource {
    async fn fetch_closes(&self, symbol: &str, limit: usize) -> sentinel_core::Result<PriceSeries> {
        Ok(self.fetch_klines(symbol, limit).await?)
    }

    fn name(&self) -> &str {
        "Binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"[
        [1735689600000, "93576.00", "95151.15", "92888.00", "94591.79", "10373.32", 1735775999999, "975637467.45", 1555875, "5116.31", "481237186.41", "0"],
        [1735776000000, "94591.78", "97839.50", "94392.00", "96984.79", "21970.49", 1735862399999, "2118577064.17", 3010340, "11047.32", "1065282003.04", "0"],
        [1735862400000, "96984.79", "98976.91", "96100.01", "98142.00", "15253.82", 1735948799999, "1489437590.79", 2425138, "7656.10", "747505498.01", "0"]
    ]"#;

    #[test]
    fn test_parse_closes() {
        let series = parse_klines("BTCUSDT", PAYLOAD).unwrap();
        assert_eq!(series.symbol, "BTCUSDT");
        assert_eq!(series.closes, vec![94591.79, 96984.79, 98142.00]);
        assert_eq!(series.latest(), Some(98142.00));
    }

    #[test]
    fn test_skips_short_and_malformed_rows() {
        let body = r#"[[1, "1", "1", "1"], [2, "1", "1", "1", "oops"], [3, "1", "1", "1", 42], [4, "1", "1", "1", "2.5"]]"#;
        let series = parse_klines("ETHUSDT", body).unwrap();
        assert_eq!(series.closes, vec![2.5]);
    }

    #[test]
    fn test_rejects_non_array_payload() {
        let body = r#"{"code": -1121, "msg": "Invalid symbol."}"#;
        assert!(matches!(parse_klines("NOPE", body), Err(RuntimeError::Parse(_))));
    }

    #[test]
    fn test_klines_url() {
        let source = BinanceKlineSource::new(BinanceConfig {
            base_url: "https://api.binance.com/".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            source.klines_url("btcusdt", 730),
            "https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=1d&limit=730"
        );
        assert!(source.klines_url("BTCUSDT", 5000).ends_with("limit=1000"));
    }
}
