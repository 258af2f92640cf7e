//! Quote validation, rate lookup through the cache and response formatting

use super::cache::Cache;
use super::currency::{CurrencyRateProvider, other_supported_currencies, ratio_key};
use super::rates::{RateSource, SourceRates, fetch_all, max_rates, rates_table};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Everything that can be wrong with a quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    MissingCurrency { currency: String },
    ServiceDown,
    NotANumber { amount: String },
    NotPositive { amount: String },
    FromCurrency { currency: String },
    ToCurrency { currency: String },
    MissingParameter { name: &'static str },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::MissingCurrency { currency } => {
                write!(f, "The exchange rate for {currency} is missing.")
            }
            Problem::ServiceDown => write!(f, "The service is temporarily down for maintenance."),
            Problem::NotANumber { amount } => write!(
                f,
                "The specified 'amount'={amount} is not a number. Please specify a positive numeric value."
            ),
            Problem::NotPositive { amount } => {
                write!(f, "The specified 'amount'={amount} is not a positive number.")
            }
            Problem::FromCurrency { currency } => {
                write!(f, "The 'from_currency_code'={currency} is not supported.")
            }
            Problem::ToCurrency { currency } => {
                write!(f, "The 'to_currency_code'={currency} is not supported.")
            }
            Problem::MissingParameter { name } => write!(f, "The '{name}' parameter is required."),
        }
    }
}

/// Which side of the pair a currency check is for.
#[derive(Debug, Clone, Copy)]
pub enum CurrencySide {
    From,
    To,
}

#[derive(Debug)]
pub enum QuoteError {
    /// The request itself is wrong; every problem found is listed.
    Invalid(Vec<Problem>),
    /// No usable rate could be obtained. Carries the cause for logging.
    ServiceDown(String),
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteError::Invalid(problems) => {
                let messages: Vec<String> = problems.iter().map(ToString::to_string).collect();
                write!(f, "{}", messages.join(" "))
            }
            QuoteError::ServiceDown(_) => write!(f, "{}", Problem::ServiceDown),
        }
    }
}

impl std::error::Error for QuoteError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub exchange_rate: String,
    pub currency_code: String,
    pub amount: String,
}

impl Quote {
    pub fn new(rate: f64, currency_code: &str, amount: f64) -> Self {
        Quote {
            exchange_rate: format!("{rate:.3}"),
            currency_code: currency_code.to_string(),
            amount: format!("{:.5}", amount * rate),
        }
    }
}

/// Parses a strictly positive, finite amount.
pub fn parse_amount(text: &str) -> Result<f64, Problem> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if value <= 0.0 {
                Err(Problem::NotPositive {
                    amount: text.to_string(),
                })
            } else {
                Ok(value)
            }
        }
        _ => Err(Problem::NotANumber {
            amount: text.to_string(),
        }),
    }
}

pub fn check_amount(text: &str) -> Option<Problem> {
    parse_amount(text).err()
}

pub fn check_supported(currency: &str, supported: &[String], side: CurrencySide) -> Option<Problem> {
    if supported.iter().any(|c| c == currency) {
        return None;
    }
    let currency = currency.to_string();
    Some(match side {
        CurrencySide::From => Problem::FromCurrency { currency },
        CurrencySide::To => Problem::ToCurrency { currency },
    })
}

/// Problems in the order amount, source currency, target currency.
pub fn check_params(from: &str, amount: &str, to: &str, supported: &[String]) -> Vec<Problem> {
    [
        check_amount(amount),
        check_supported(from, supported, CurrencySide::From),
        check_supported(to, supported, CurrencySide::To),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Answers quote requests from cached rates, refreshing them from the
/// configured sources when a pair is missing or expired.
pub struct QuoteService {
    sources: Vec<Arc<dyn RateSource>>,
    cache: Arc<dyn Cache<String, f64>>,
    supported: Vec<String>,
    life_time: Duration,
    /// One lock per base currency; refreshes of different bases run in parallel
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QuoteService {
    pub fn new(
        sources: Vec<Arc<dyn RateSource>>,
        cache: Arc<dyn Cache<String, f64>>,
        supported: Vec<String>,
        life_time: Duration,
    ) -> Self {
        Self {
            sources,
            cache,
            supported,
            life_time,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn supported_currencies(&self) -> &[String] {
        &self.supported
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    #[instrument(name = "Quote", skip(self))]
    pub async fn get_quote(&self, from: &str, amount: &str, to: &str) -> Result<Quote, QuoteError> {
        info!("Quote requested");
        let problems = check_params(from, amount, to, &self.supported);
        if !problems.is_empty() {
            debug!(?problems, "Rejected quote request");
            return Err(QuoteError::Invalid(problems));
        }
        let amount = parse_amount(amount).map_err(|p| QuoteError::Invalid(vec![p]))?;

        let rate = self
            .rate(from, to)
            .await
            .map_err(|e| QuoteError::ServiceDown(e.to_string()))?;
        let rate = match rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => rate,
            Some(rate) => {
                return Err(QuoteError::ServiceDown(format!(
                    "Invalid rate {rate} for {}",
                    ratio_key(from, to)
                )));
            }
            None => {
                let problem = Problem::MissingCurrency {
                    currency: to.to_string(),
                };
                return Err(QuoteError::ServiceDown(problem.to_string()));
            }
        };

        let quote = Quote::new(rate, to, amount);
        info!(?quote, "Quote answered");
        Ok(quote)
    }

    /// The rate of a pair, from the cache when possible. `None` when the
    /// sources did not provide it.
    pub async fn rate(&self, from: &str, to: &str) -> Result<Option<f64>> {
        if from == to {
            return Ok(Some(1.0));
        }
        let key = ratio_key(from, to);
        if let Some(rate) = self.cache.get(&key).await {
            return Ok(Some(rate));
        }

        let lock = self.refresh_lock(from).await;
        let _guard = lock.lock().await;
        // Another request may have refreshed while we waited
        if let Some(rate) = self.cache.get(&key).await {
            return Ok(Some(rate));
        }
        let results = self.refresh_locked(from).await?;
        Ok(max_rates(&results).get(to).copied())
    }

    /// Fetches fresh rates for `base`, stores the best of them and returns
    /// what every source answered.
    pub async fn refresh_rates(&self, base: &str) -> Result<Vec<SourceRates>> {
        let lock = self.refresh_lock(base).await;
        let _guard = lock.lock().await;
        self.refresh_locked(base).await
    }

    async fn refresh_lock(&self, base: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        Arc::clone(locks.entry(base.to_string()).or_default())
    }

    async fn refresh_locked(&self, base: &str) -> Result<Vec<SourceRates>> {
        let results = self.source_rates(base).await?;
        let best = max_rates(&results);
        debug!("Rates for {base}:\n{}", rates_table(&results, &best));

        for (to, rate) in &best {
            self.cache
                .put(ratio_key(base, to), *rate, Some(self.life_time))
                .await;
        }
        info!(base, pairs = best.len(), "Refreshed rate cache");
        Ok(results)
    }

    /// Rates of every source for `base`, bypassing the cache.
    pub async fn source_rates(&self, base: &str) -> Result<Vec<SourceRates>> {
        if !self.supported.iter().any(|c| c == base) {
            return Err(anyhow!("Currency {base} is not supported"));
        }
        let symbols = other_supported_currencies(&self.supported, base);
        let results = fetch_all(&self.sources, base, &symbols).await?;
        for symbol in &symbols {
            if !results.iter().any(|r| r.rates.contains_key(symbol)) {
                warn!(base, currency = %symbol, "No source provided a rate");
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl CurrencyRateProvider for QuoteService {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        self.rate(from, to)
            .await?
            .ok_or_else(|| anyhow!("{}", Problem::MissingCurrency { currency: to.to_string() }))
    }
}
