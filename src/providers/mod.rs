pub mod exchange_rate;
pub mod openrates;
pub mod util;

use crate::core::config::ProvidersConfig;
use crate::core::rates::{RateSource, RateTable, select_supported};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub use exchange_rate::ExchangeRateSource;
pub use openrates::OpenRatesSource;

const USER_AGENT: &str = concat!("quotes-api/", env!("CARGO_PKG_VERSION"));

/// Retry policy shared by the HTTP sources.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl From<&ProvidersConfig> for RetryPolicy {
    fn from(config: &ProvidersConfig) -> Self {
        Self {
            retries: config.retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

pub(crate) fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, Value>,
}

/// Reads a `{"rates": {...}}` body and keeps the wanted symbols. Values that
/// are not numbers become NaN so the aggregation drops and reports them.
pub(crate) async fn read_rates(
    response: reqwest::Response,
    source: &str,
    symbols: &[String],
) -> Result<RateTable> {
    if !response.status().is_success() {
        return Err(anyhow!(
            "HTTP error: {} from {}",
            response.status(),
            source
        ));
    }

    let text = response.text().await?;
    let data: RatesResponse = match serde_json::from_str(&text) {
        Ok(data) => data,
        Err(e) => {
            error!(error = ?e, response = %text, "Failed to parse rates response");
            return Err(anyhow!("Failed to parse JSON response from {}: {}", source, e));
        }
    };
    debug!(source, count = data.rates.len(), "Parsed rates response");

    let raw = data.rates.into_iter().map(|(code, value)| {
        let rate = match &value {
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        };
        (code, rate)
    });
    Ok(select_supported(raw, symbols))
}

/// Builds every source enabled in the configuration.
pub fn configured_sources(config: &ProvidersConfig) -> Result<Vec<Arc<dyn RateSource>>> {
    let retry = RetryPolicy::from(config);
    let mut sources: Vec<Arc<dyn RateSource>> = Vec::new();
    if let Some(openrates) = &config.openrates {
        sources.push(Arc::new(OpenRatesSource::new(&openrates.base_url, retry)?));
    }
    if let Some(exchange_rate) = &config.exchange_rate {
        sources.push(Arc::new(ExchangeRateSource::new(
            &exchange_rate.base_url,
            retry,
        )?));
    }
    if sources.is_empty() {
        anyhow::bail!("No rate providers configured");
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SourceConfig;

    #[test]
    fn test_configured_sources() {
        let sources = configured_sources(&ProvidersConfig::default()).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["openrates", "exchange_rate"]);

        let only_one = ProvidersConfig {
            openrates: None,
            exchange_rate: Some(SourceConfig {
                base_url: "http://localhost".to_string(),
            }),
            ..ProvidersConfig::default()
        };
        assert_eq!(configured_sources(&only_one).unwrap().len(), 1);
    }

    #[test]
    fn test_no_sources_is_an_error() {
        let none = ProvidersConfig {
            openrates: None,
            exchange_rate: None,
            ..ProvidersConfig::default()
        };
        let err = configured_sources(&none).err().unwrap();
        assert_eq!(err.to_string(), "No rate providers configured");
    }
}
