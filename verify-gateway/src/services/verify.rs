use async_trait::async_trait;
use serde_json::{json, Value};
use service_core::error::AppError;
use thiserror::Error;

use crate::models::{Challenge, Factor};

/// The three operations the gateway needs from a verification provider.
#[async_trait]
pub trait VerifyProvider: Send + Sync {
    /// Create an unverified TOTP factor for `identity`.
    async fn create_factor(&self, identity: &str, friendly_name: &str)
        -> Result<Factor, ProviderError>;

    /// Submit `code` against an unverified factor to activate it.
    async fn verify_factor(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<Factor, ProviderError>;

    /// Check `code` against a verified factor.
    async fn create_challenge(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<Challenge, ProviderError>;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
        more_info: Option<String>,
    },

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// The body handed back to gateway callers under `error`.
    pub fn payload(&self) -> Value {
        match self {
            ProviderError::Api {
                status,
                code,
                message,
                more_info,
            } => json!({
                "status": status,
                "code": code,
                "message": message,
                "moreInfo": more_info,
            }),
            ProviderError::Transport(e) => Value::String(e.to_string()),
            other => json!({ "message": other.to_string() }),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err.payload())
    }
}
