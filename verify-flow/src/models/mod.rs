//! Gateway response shapes as seen by the flow.
//!
//! The gateway passes provider records through untouched, so everything
//! beyond the identifiers the flow needs stays optional or raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_VERIFIED: &str = "verified";
pub const STATUS_APPROVED: &str = "approved";

/// Provisioning material for the authenticator app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// A factor returned by create-factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factor {
    pub factor_sid: String,
    #[serde(default)]
    pub entity_sid: Option<String>,
    pub identity: String,
    #[serde(default)]
    pub binding: Option<Binding>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub config: Option<Value>,
}

impl Factor {
    pub fn is_verified(&self) -> bool {
        self.status.as_deref() == Some(STATUS_VERIFIED)
    }
}

/// Response of verify-factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Raw factor record after the update.
    #[serde(default)]
    pub updated: Option<Value>,
}

impl VerificationResult {
    /// The top-level status, falling back to the nested record's.
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .or_else(|| nested_status(self.updated.as_ref()))
    }

    pub fn is_verified(&self) -> bool {
        self.status.as_deref() == Some(STATUS_VERIFIED)
            || nested_status(self.updated.as_ref()) == Some(STATUS_VERIFIED)
    }
}

/// Response of challenge. Approved and denied are both results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResult {
    #[serde(default)]
    pub challenge_sid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Raw challenge record.
    #[serde(default)]
    pub challenge: Option<Value>,
}

impl ChallengeResult {
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .or_else(|| nested_status(self.challenge.as_ref()))
    }

    pub fn is_approved(&self) -> bool {
        self.status.as_deref() == Some(STATUS_APPROVED)
            || nested_status(self.challenge.as_ref()) == Some(STATUS_APPROVED)
    }
}

fn nested_status(record: Option<&Value>) -> Option<&str> {
    record?.get("status")?.as_str()
}
