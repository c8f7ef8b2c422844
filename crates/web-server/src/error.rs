use analytics::AnalyticsError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Analytics(AnalyticsError::UnknownIndex(name)) => (
                StatusCode::NOT_FOUND,
                format!("Index '{name}' not found. Use /indices to see available indices."),
            ),
            AppError::Analytics(err @ AnalyticsError::InvalidPeriod(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Analytics(err @ AnalyticsError::InternalError(_)) => {
                tracing::error!(error = ?err, "Analytics error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while generating the heatmap".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
