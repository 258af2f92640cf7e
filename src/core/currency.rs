//! Currency conversion abstractions

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

/// Every supported currency except `base`, in configured order.
pub fn other_supported_currencies(supported: &[String], base: &str) -> Vec<String> {
    supported
        .iter()
        .filter(|currency| currency.as_str() != base)
        .cloned()
        .collect()
}

/// Cache key of a currency pair, e.g. `USD:ILS`.
pub fn ratio_key(from: &str, to: &str) -> String {
    format!("{from}:{to}")
}
