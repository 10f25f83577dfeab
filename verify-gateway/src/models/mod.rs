//! Records owned by the verification provider.
//!
//! Only the fields the gateway reads are typed. Everything else the provider
//! sends is kept in `extra` and serialized back out untouched, so a schema
//! change upstream never breaks the pass-through.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state of a factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    Unverified,
    Verified,
    #[serde(untagged)]
    Other(String),
}

/// Outcome of a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Approved,
    Denied,
    Expired,
    #[serde(untagged)]
    Other(String),
}

/// Provisioning material for an authenticator app. Only present on the
/// response that created the factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorBinding {
    pub secret: String,
    pub uri: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A TOTP factor as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub sid: String,
    #[serde(default)]
    pub entity_sid: Option<String>,
    pub identity: String,
    #[serde(default)]
    pub binding: Option<FactorBinding>,
    pub status: FactorStatus,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Factor {
    pub fn is_verified(&self) -> bool {
        self.status == FactorStatus::Verified
    }
}

/// A single authentication attempt against a factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub sid: String,
    pub status: ChallengeStatus,
    pub identity: String,
    #[serde(default)]
    pub factor_sid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
