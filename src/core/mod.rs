//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod log;
pub mod quote;
pub mod rates;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use currency::CurrencyRateProvider;
pub use quote::{Problem, Quote, QuoteError, QuoteService};
pub use rates::{RateSource, RateTable, SourceRates};
