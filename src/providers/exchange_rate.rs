use super::util::with_retry;
use super::{RetryPolicy, build_client, read_rates};
use crate::core::rates::{RateSource, RateTable};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// The exchangerate-api v4 endpoint. It returns every currency it knows, so
/// the symbols are filtered locally.
pub struct ExchangeRateSource {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ExchangeRateSource {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client()?,
            retry,
        })
    }
}

#[async_trait]
impl RateSource for ExchangeRateSource {
    fn name(&self) -> &'static str {
        "exchange_rate"
    }

    #[instrument(name = "ExchangeRateFetch", skip(self, symbols), fields(base = %base))]
    async fn fetch_rates(&self, base: &str, symbols: &[String]) -> Result<RateTable> {
        let url = format!("{}/v4/latest/{}", self.base_url, base);
        debug!("Requesting rates from {}", url);

        let response = with_retry(
            || self.client.get(&url).send(),
            self.retry.retries,
            self.retry.delay,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for base: {} URL: {}", e, base, url))?;

        read_rates(response, self.name(), symbols).await
    }
}
