use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    /// A request body failed its `Validate` rules. Answered as a 400 whose
    /// body is the first field message.
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Error reported by an upstream provider. The payload is handed back to
    /// the caller untouched.
    #[error("Provider error: {0}")]
    Provider(Value),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Provider(_) | AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// First field message of a failed validation, taking fields in name order.
/// Falls back to the full report when no rule carries a message.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

/// Wire shape of every error body: `{"error": <string | object>}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: Value,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error = match self {
            AppError::ValidationError(errors) => Value::String(validation_message(&errors)),
            AppError::BadRequest(msg) => Value::String(msg),
            AppError::Provider(payload) => payload,
            AppError::InternalError(err) => Value::String(err.to_string()),
            AppError::ConfigError(_) => Value::String("Configuration error".to_string()),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
