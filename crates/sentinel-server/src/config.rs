//! Environment Configuration

use std::str::FromStr;
use std::time::Duration;

use sentinel_core::{BandPosition, ExternalSignals, SentinelError};
use sentinel_core::indicators::DEFAULT_LOOKBACK_DAYS;

type Result<T> = std::result::Result<T, SentinelError>;

/// One week
pub const DEFAULT_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SentinelConfig {
    /// `None` means reports only go to the log
    pub telegram: Option<TelegramCredentials>,

    pub binance_base_url: String,
    pub coinmetrics_base_url: String,

    /// `host:port` proxy for every outbound request
    pub proxy: Option<String>,

    pub signals: ExternalSignals,

    pub dispersion_lookback: usize,
    pub dispersion_fallback: bool,

    pub schedule_interval: Duration,
    pub run_on_start: bool,

    pub delivery_retries: u32,

    pub bind_addr: String,
}

impl SentinelConfig {
    /// Read from the process environment (call `dotenvy::dotenv()` first)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramCredentials { bot_token, chat_id }),
            (None, None) => None,
            _ => {
                return Err(SentinelError::Config(
                    "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must be set together".into(),
                ));
            }
        };

        let signals = ExternalSignals {
            account_leverage: parse_or(get("LEVERAGE"), "LEVERAGE", 1.0)?,
            trend_cross: parse_flag(get("TREND_CROSS"), "TREND_CROSS", false)?,
            eth_band: get("ETH_BAND")
                .map(|v| BandPosition::from_str(&v))
                .transpose()?
                .unwrap_or_default(),
        };
        if !signals.account_leverage.is_finite() || signals.account_leverage < 0.0 {
            return Err(SentinelError::Config(format!(
                "LEVERAGE must be a non-negative number, got {}",
                signals.account_leverage
            )));
        }

        let interval_secs: u64 = parse_or(
            get("SCHEDULE_INTERVAL_SECS"),
            "SCHEDULE_INTERVAL_SECS",
            DEFAULT_INTERVAL_SECS,
        )?;
        if interval_secs == 0 {
            return Err(SentinelError::Config("SCHEDULE_INTERVAL_SECS must be positive".into()));
        }

        let delivery_retries: u32 = parse_or(get("DELIVERY_RETRIES"), "DELIVERY_RETRIES", 3)?;
        if delivery_retries == 0 {
            return Err(SentinelError::Config("DELIVERY_RETRIES must be at least 1".into()));
        }

        let dispersion_lookback: usize = parse_or(
            get("DISPERSION_LOOKBACK_DAYS"),
            "DISPERSION_LOOKBACK_DAYS",
            DEFAULT_LOOKBACK_DAYS,
        )?;
        if dispersion_lookback < 2 {
            return Err(SentinelError::Config("DISPERSION_LOOKBACK_DAYS must be at least 2".into()));
        }

        Ok(Self {
            telegram,
            binance_base_url: get("BINANCE_BASE_URL")
                .unwrap_or_else(|| "https://api.binance.com".into()),
            coinmetrics_base_url: get("COINMETRICS_BASE_URL")
                .unwrap_or_else(|| "https://community-api.coinmetrics.io/v4".into()),
            proxy: get("HTTP_PROXY_ADDR"),
            signals,
            dispersion_lookback,
            dispersion_fallback: parse_flag(
                get("DISPERSION_FALLBACK"),
                "DISPERSION_FALLBACK",
                false,
            )?,
            schedule_interval: Duration::from_secs(interval_secs),
            run_on_start: parse_flag(get("RUN_ON_START"), "RUN_ON_START", false)?,
            delivery_retries,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    value.map_or(Ok(default), |v| {
        v.parse()
            .map_err(|_| SentinelError::Config(format!("{key}: cannot parse '{v}'")))
    })
}

fn parse_flag(value: Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(v) = value else {
        return Ok(default);
    };
    match v.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(SentinelError::Config(format!("{key}: expected true or false, got '{v}'"))),
    }
}
