use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use service_core::observability::TracedClientExt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::FlowError;
use crate::models::{ChallengeResult, Factor, VerificationResult};

/// The three gateway calls the flow makes.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn create_factor(
        &self,
        identity: &str,
        friendly_name: Option<&str>,
    ) -> Result<Factor, FlowError>;

    async fn verify_factor(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<VerificationResult, FlowError>;

    async fn challenge(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<ChallengeResult, FlowError>;
}

#[async_trait]
impl<T: GatewayApi + ?Sized> GatewayApi for Arc<T> {
    async fn create_factor(
        &self,
        identity: &str,
        friendly_name: Option<&str>,
    ) -> Result<Factor, FlowError> {
        (**self).create_factor(identity, friendly_name).await
    }

    async fn verify_factor(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<VerificationResult, FlowError> {
        (**self).verify_factor(identity, factor_sid, code).await
    }

    async fn challenge(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<ChallengeResult, FlowError> {
        (**self).challenge(identity, factor_sid, code).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    CreateFactor,
    VerifyFactor,
    Challenge,
}

impl Action {
    fn path(self) -> &'static str {
        match self {
            Action::CreateFactor => "/create-factor",
            Action::VerifyFactor => "/verify-factor",
            Action::Challenge => "/challenge",
        }
    }

    /// Shown when the gateway's error body says nothing useful.
    fn fallback_message(self) -> &'static str {
        match self {
            Action::CreateFactor => "Failed to create factor",
            Action::VerifyFactor => "Verification failed. Please check your code.",
            Action::Challenge => "Challenge failed",
        }
    }
}

/// Picks the user-facing message out of a gateway error body.
///
/// `error` may be a string, an object with `message`, or any other JSON.
fn error_message(body: &Value, action: Action) -> String {
    match body.get("error") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(Value::Null) | Some(Value::String(_)) | None => action.fallback_message().to_string(),
        Some(error) => match error.get("message").and_then(Value::as_str) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => error.to_string(),
        },
    }
}

/// HTTP client for the verify gateway.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body with trace context and a fresh request ID.
    async fn post<T: DeserializeOwned>(&self, action: Action, body: Value) -> Result<T, FlowError> {
        let url = format!("{}{}", self.base_url, action.path());
        let request_id = Uuid::new_v4().to_string();

        let response = self
            .client
            .traced_post(&url)
            .json(&body)
            .send_with_request_id(&request_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                FlowError::Transport(e.to_string())
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FlowError::Transport(e.to_string()))?;

        tracing::debug!(
            status = %status,
            request_id = %request_id,
            path = action.path(),
            "Gateway response"
        );

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(|e| {
                tracing::error!(error = %e, path = action.path(), "Unreadable gateway response");
                FlowError::Transport(format!("Unexpected gateway response: {}", e))
            })
        } else {
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            Err(FlowError::Gateway(error_message(&body, action)))
        }
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn create_factor(
        &self,
        identity: &str,
        friendly_name: Option<&str>,
    ) -> Result<Factor, FlowError> {
        self.post(
            Action::CreateFactor,
            json!({ "identity": identity, "friendlyName": friendly_name }),
        )
        .await
    }

    async fn verify_factor(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<VerificationResult, FlowError> {
        self.post(
            Action::VerifyFactor,
            json!({ "identity": identity, "factorSid": factor_sid, "code": code }),
        )
        .await
    }

    async fn challenge(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<ChallengeResult, FlowError> {
        self.post(
            Action::Challenge,
            json!({ "identity": identity, "factorSid": factor_sid, "code": code }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_errors_are_used_as_is() {
        let body = json!({ "error": "identity is required" });
        assert_eq!(
            error_message(&body, Action::CreateFactor),
            "identity is required"
        );
    }

    #[test]
    fn object_errors_prefer_message() {
        let body = json!({ "error": { "status": 404, "message": "Factor not found" } });
        assert_eq!(error_message(&body, Action::VerifyFactor), "Factor not found");

        let body = json!({ "error": { "code": 60312 } });
        assert_eq!(error_message(&body, Action::Challenge), r#"{"code":60312}"#);
    }

    #[test]
    fn missing_errors_fall_back_per_action() {
        assert_eq!(
            error_message(&Value::Null, Action::CreateFactor),
            "Failed to create factor"
        );
        assert_eq!(
            error_message(&json!({ "error": "" }), Action::VerifyFactor),
            "Verification failed. Please check your code."
        );
        assert_eq!(
            error_message(&json!({ "error": null }), Action::Challenge),
            "Challenge failed"
        );
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        assert_eq!(
            GatewayClient::new("http://localhost:4000/api/").base_url(),
            "http://localhost:4000/api"
        );
    }
}
