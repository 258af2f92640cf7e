use super::error::ApiError;
use crate::core::{Problem, Quote, QuoteError, QuoteService};
use axum::{Json, extract::Query, extract::State};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const QUOTE_PARAMS: [&str; 3] = ["from_currency_code", "amount", "to_currency_code"];

/// `GET /?from_currency_code=USD&amount=10&to_currency_code=ILS`
pub async fn index(
    State(quotes): State<Arc<QuoteService>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Quote>, ApiError> {
    info!(?params, "request");

    let missing: Vec<Problem> = QUOTE_PARAMS
        .iter()
        .filter(|name| !params.contains_key(**name))
        .map(|name| Problem::MissingParameter { name: *name })
        .collect();
    if !missing.is_empty() {
        return Err(QuoteError::Invalid(missing).into());
    }

    let quote = quotes
        .get_quote(
            &params["from_currency_code"],
            &params["amount"],
            &params["to_currency_code"],
        )
        .await?;
    info!(?quote, "response");
    Ok(Json(quote))
}

#[derive(Serialize)]
pub struct CurrenciesResponse {
    pub supported_currencies: Vec<String>,
}

/// `GET /currencies`
pub async fn currencies(State(quotes): State<Arc<QuoteService>>) -> Json<CurrenciesResponse> {
    Json(CurrenciesResponse {
        supported_currencies: quotes.supported_currencies().to_vec(),
    })
}
