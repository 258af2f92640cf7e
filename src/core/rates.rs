//! Rate sources and the aggregation of their answers

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, CellAlignment, Table, presets::ASCII_FULL};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rates of one base currency, keyed by target currency code.
pub type RateTable = BTreeMap<String, f64>;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Short name used in logs and tables.
    fn name(&self) -> &'static str;

    /// Fetches the rates of `base` into every currency in `symbols`.
    async fn fetch_rates(&self, base: &str, symbols: &[String]) -> Result<RateTable>;
}

#[derive(Debug, Clone)]
pub struct SourceRates {
    pub source: &'static str,
    pub rates: RateTable,
    pub fetched_at: DateTime<Utc>,
}

/// Keeps only the entries of `raw` that are in `symbols`.
pub fn select_supported<I>(raw: I, symbols: &[String]) -> RateTable
where
    I: IntoIterator<Item = (String, f64)>,
{
    raw.into_iter()
        .filter(|(code, _)| symbols.contains(code))
        .collect()
}

/// Removes rates that are not finite positive numbers. Symbols the source did
/// not return at all are only reported.
pub fn drop_invalid_rates(source: &str, rates: &mut RateTable, symbols: &[String]) {
    for symbol in symbols {
        match rates.get(symbol).copied() {
            None => warn!(source, currency = %symbol, "Rate missing from source"),
            Some(rate) if !rate.is_finite() || rate <= 0.0 => {
                warn!(source, currency = %symbol, rate, "Dropping invalid rate");
                rates.remove(symbol);
            }
            Some(_) => {}
        }
    }
}

/// Queries every source concurrently. Failed sources are logged and left out;
/// the call only fails when no source answered.
pub async fn fetch_all(
    sources: &[Arc<dyn RateSource>],
    base: &str,
    symbols: &[String],
) -> Result<Vec<SourceRates>> {
    let results = join_all(sources.iter().map(|source| async move {
        let result = source.fetch_rates(base, symbols).await;
        (source.name(), result)
    }))
    .await;

    let mut answered = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (name, result) in results {
        match result {
            Ok(mut rates) => {
                drop_invalid_rates(name, &mut rates, symbols);
                debug!(source = name, ?rates, "Source answered");
                answered.push(SourceRates {
                    source: name,
                    rates,
                    fetched_at: Utc::now(),
                });
            }
            Err(e) => {
                warn!(source = name, error = %e, "Rate source failed");
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    if answered.is_empty() {
        return Err(anyhow!(
            "No rate source answered for {}: {}",
            base,
            failures.join("; ")
        ));
    }
    Ok(answered)
}

/// The highest rate per currency across all sources.
pub fn max_rates(results: &[SourceRates]) -> RateTable {
    let mut best = RateTable::new();
    for result in results {
        for (code, rate) in &result.rates {
            best.entry(code.clone())
                .and_modify(|current| *current = current.max(*rate))
                .or_insert(*rate);
        }
    }
    best
}

/// Renders one row per source plus the `max` row, psql style.
pub fn rates_table(results: &[SourceRates], max: &RateTable) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let mut header = vec![Cell::new("")];
    header.extend(max.keys().map(Cell::new));
    table.set_header(header);

    let rows = results
        .iter()
        .map(|r| (r.source, &r.rates))
        .chain(std::iter::once(("max", max)));
    for (name, rates) in rows {
        let mut row = vec![Cell::new(name)];
        row.extend(max.keys().map(|code| {
            let text = rates
                .get(code)
                .map_or_else(|| "NaN".to_string(), |rate| format!("{rate}"));
            Cell::new(text).set_alignment(CellAlignment::Right)
        }));
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        name: &'static str,
        rates: Option<Vec<(&'static str, f64)>>,
    }

    #[async_trait]
    impl RateSource for FixedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_rates(&self, _base: &str, _symbols: &[String]) -> Result<RateTable> {
            match &self.rates {
                Some(rates) => Ok(rates.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
                None => Err(anyhow!("connection refused")),
            }
        }
    }

    fn symbols() -> Vec<String> {
        vec!["EUR".to_string(), "ILS".to_string()]
    }

    fn source(name: &'static str, rates: Option<Vec<(&'static str, f64)>>) -> Arc<dyn RateSource> {
        Arc::new(FixedSource { name, rates })
    }

    #[test]
    fn test_select_supported() {
        let raw = vec![
            ("EUR".to_string(), 0.83),
            ("GBP".to_string(), 0.74),
            ("ILS".to_string(), 3.3),
        ];
        let table = select_supported(raw, &symbols());
        assert_eq!(table.len(), 2);
        assert!(!table.contains_key("GBP"));
    }

    #[test]
    fn test_drop_invalid_rates() {
        let mut rates: RateTable = [("EUR".to_string(), -1.0), ("ILS".to_string(), 3.3)]
            .into_iter()
            .collect();
        drop_invalid_rates("test", &mut rates, &symbols());
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get("ILS"), Some(&3.3));

        let mut rates: RateTable = [("EUR".to_string(), f64::NAN)].into_iter().collect();
        drop_invalid_rates("test", &mut rates, &symbols());
        assert!(rates.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_and_max() {
        let sources = vec![
            source("a", Some(vec![("EUR", 0.8389261745), ("ILS", 3.3077181208)])),
            source("b", Some(vec![("EUR", 0.837996), ("ILS", 3.323482)])),
        ];
        let results = fetch_all(&sources, "USD", &symbols()).await.unwrap();
        assert_eq!(results.len(), 2);

        let max = max_rates(&results);
        assert_eq!(max.get("EUR"), Some(&0.8389261745));
        assert_eq!(max.get("ILS"), Some(&3.323482));
    }

    #[tokio::test]
    async fn test_fetch_all_tolerates_one_failure() {
        let sources = vec![
            source("down", None),
            source("up", Some(vec![("EUR", 0.9), ("ILS", 0.0)])),
        ];
        let results = fetch_all(&sources, "USD", &symbols()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "up");
        // The zero rate is dropped
        assert_eq!(max_rates(&results).len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_fails_when_every_source_fails() {
        let sources = vec![source("a", None), source("b", None)];
        let err = fetch_all(&sources, "USD", &symbols()).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("No rate source answered for USD"));
        assert!(message.contains("a: connection refused"));
    }

    #[test]
    fn test_rates_table_has_max_row() {
        let results = vec![
            SourceRates {
                source: "a",
                rates: [("EUR".to_string(), 0.8)].into_iter().collect(),
                fetched_at: Utc::now(),
            },
            SourceRates {
                source: "b",
                rates: [("EUR".to_string(), 0.9), ("ILS".to_string(), 3.3)]
                    .into_iter()
                    .collect(),
                fetched_at: Utc::now(),
            },
        ];
        let max = max_rates(&results);
        let rendered = rates_table(&results, &max).to_string();
        assert!(rendered.contains("max"));
        assert!(rendered.contains("NaN"));
        assert!(rendered.contains("3.3"));
    }
}
