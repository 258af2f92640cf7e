use crate::core::{Problem, QuoteError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error side of every handler. Converts into a JSON body with an `Error` key.
#[derive(Debug)]
pub struct ApiError(pub QuoteError);

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            QuoteError::Invalid(problems) => {
                let messages: Vec<String> = problems.iter().map(ToString::to_string).collect();
                (StatusCode::BAD_REQUEST, json!({ "Error": messages }))
            }
            QuoteError::ServiceDown(cause) => {
                tracing::error!("Service down: {}", cause);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "Error": Problem::ServiceDown.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
