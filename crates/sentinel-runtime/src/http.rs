//! Shared HTTP Client Setup

use std::time::Duration;

use reqwest::Client;

use crate::error::{Result, RuntimeError};

/// Outbound HTTP settings shared by every integration
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Optional `host:port` HTTP proxy
    pub proxy: Option<String>,

    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            proxy: None,
            user_agent: concat!("crypto-sentinel/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Build a client honoring the timeout, proxy and user agent
    pub fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(self.user_agent.clone());

        if let Some(addr) = &self.proxy {
            let url = if addr.contains("://") {
                addr.clone()
            } else {
                format!("http://{addr}")
            };
            let proxy = reqwest::Proxy::all(&url)
                .map_err(|e| RuntimeError::Config(format!("invalid proxy '{addr}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("crypto-sentinel/"));
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn test_proxy_address_without_scheme() {
        let config = HttpConfig::default().with_proxy(Some("127.0.0.1:10809".into()));
        assert!(config.build_client().is_ok());
    }
}
