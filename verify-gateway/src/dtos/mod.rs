//! Request and response envelopes of the public `/api` surface.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::{Challenge, ChallengeStatus, Factor, FactorBinding, FactorStatus};

/// Body of `POST /api/create-factor`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFactorRequest {
    #[serde(default, deserialize_with = "text")]
    #[validate(length(
        min = 1,
        message = "identity is required (use your internal user id, 8-64 chars, dash-separated alphanumeric recommended)"
    ))]
    pub identity: String,
    #[serde(default, deserialize_with = "present_string")]
    pub friendly_name: Option<String>,
}

/// Body of `POST /api/verify-factor` and `POST /api/challenge`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FactorCodeRequest {
    #[serde(default, deserialize_with = "text")]
    #[validate(length(min = 1, message = "identity, factorSid and code are required"))]
    pub identity: String,
    #[serde(default, deserialize_with = "text_or_number")]
    #[validate(length(min = 1, message = "identity, factorSid and code are required"))]
    pub factor_sid: String,
    #[serde(default, deserialize_with = "text_or_number")]
    #[validate(length(min = 1, message = "identity, factorSid and code are required"))]
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFactorResponse {
    pub factor_sid: String,
    pub entity_sid: Option<String>,
    pub identity: String,
    pub binding: Option<FactorBinding>,
    pub status: FactorStatus,
    pub config: Option<Value>,
}

impl From<Factor> for CreateFactorResponse {
    fn from(factor: Factor) -> Self {
        Self {
            factor_sid: factor.sid,
            entity_sid: factor.entity_sid,
            identity: factor.identity,
            binding: factor.binding,
            status: factor.status,
            config: factor.config,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyFactorResponse {
    pub sid: String,
    pub status: FactorStatus,
    /// Full provider record after the update.
    pub updated: Factor,
}

impl From<Factor> for VerifyFactorResponse {
    fn from(updated: Factor) -> Self {
        Self {
            sid: updated.sid.clone(),
            status: updated.status.clone(),
            updated,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub challenge_sid: String,
    pub status: ChallengeStatus,
    pub challenge: Challenge,
}

impl From<Challenge> for ChallengeResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            challenge_sid: challenge.sid.clone(),
            status: challenge.status.clone(),
            challenge,
        }
    }
}

/// Treats `null`, non-string values and empty strings as absent.
fn present_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Strings pass through; anything else reads as empty.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(present_string(deserializer)?.unwrap_or_default())
}

/// Like [`text`], but numbers keep their decimal form. Clients often send a
/// TOTP code as a JSON number.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
