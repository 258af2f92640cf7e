use super::util::with_retry;
use super::{RetryPolicy, build_client, read_rates};
use crate::core::rates::{RateSource, RateTable};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, instrument};

/// The openrates `latest` endpoint, which filters symbols server side.
pub struct OpenRatesSource {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenRatesSource {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client()?,
            retry,
        })
    }

    fn url(&self, base: &str, symbols: &[String]) -> Result<Url> {
        let symbols = symbols.join(",");
        Url::parse_with_params(
            &format!("{}/latest", self.base_url),
            &[("base", base), ("symbols", symbols.as_str())],
        )
        .with_context(|| format!("Invalid openrates base URL: {}", self.base_url))
    }
}

#[async_trait]
impl RateSource for OpenRatesSource {
    fn name(&self) -> &'static str {
        "openrates"
    }

    #[instrument(name = "OpenRatesFetch", skip(self, symbols), fields(base = %base))]
    async fn fetch_rates(&self, base: &str, symbols: &[String]) -> Result<RateTable> {
        let url = self.url(base, symbols)?;
        debug!("Requesting rates from {}", url);

        let response = with_retry(
            || self.client.get(url.clone()).send(),
            self.retry.retries,
            self.retry.delay,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for base: {} URL: {}", e, base, url))?;

        read_rates(response, self.name(), symbols).await
    }
}
