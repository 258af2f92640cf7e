use crate::core::QuoteService;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<QuoteService>,
}

impl FromRef<AppState> for Arc<QuoteService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.quotes)
    }
}
