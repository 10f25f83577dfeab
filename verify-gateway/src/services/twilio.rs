//! Twilio Verify v2 client.
//!
//! Covers the TOTP subset of the Factors and Challenges API: factor creation,
//! factor verification and challenge creation. Requests are form-encoded and
//! authenticated with the account SID and auth token.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use service_core::observability::TracedClientExt;

use super::verify::{ProviderError, VerifyProvider};
use crate::config::TwilioConfig;
use crate::models::{Challenge, Factor};

/// Twilio REST exception body.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: String,
    more_info: Option<String>,
    status: Option<u16>,
}

#[derive(Clone)]
pub struct TwilioVerifyClient {
    client: Client,
    config: TwilioConfig,
}

impl TwilioVerifyClient {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn entity_url(&self, identity: &str) -> String {
        format!(
            "{}/Services/{}/Entities/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.verify_service_sid,
            urlencoding::encode(identity)
        )
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .traced_post(url)
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Bodies carry TOTP secrets, so only the status is logged.
        tracing::debug!(status = %status, url = %url, "Twilio Verify response");

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            let error = serde_json::from_str::<TwilioErrorBody>(&body).unwrap_or_else(|_| {
                TwilioErrorBody {
                    code: None,
                    message: body.clone(),
                    more_info: None,
                    status: None,
                }
            });
            tracing::error!(
                status = %status,
                code = ?error.code,
                message = %error.message,
                "Twilio Verify request failed"
            );
            Err(ProviderError::Api {
                status: error.status.unwrap_or(status.as_u16()),
                code: error.code,
                message: error.message,
                more_info: error.more_info,
            })
        }
    }
}

#[async_trait]
impl VerifyProvider for TwilioVerifyClient {
    async fn create_factor(
        &self,
        identity: &str,
        friendly_name: &str,
    ) -> Result<Factor, ProviderError> {
        let url = format!("{}/Factors", self.entity_url(identity));
        let factor: Factor = self
            .post_form(
                &url,
                &[("FactorType", "totp"), ("FriendlyName", friendly_name)],
            )
            .await?;

        tracing::info!(
            factor_sid = %factor.sid,
            status = ?factor.status,
            "Twilio TOTP factor created"
        );
        Ok(factor)
    }

    async fn verify_factor(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<Factor, ProviderError> {
        let url = format!(
            "{}/Factors/{}",
            self.entity_url(identity),
            urlencoding::encode(factor_sid)
        );
        self.post_form(&url, &[("AuthPayload", code)]).await
    }

    async fn create_challenge(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<Challenge, ProviderError> {
        let url = format!("{}/Challenges", self.entity_url(identity));
        self.post_form(&url, &[("FactorSid", factor_sid), ("AuthPayload", code)])
            .await
    }
}
