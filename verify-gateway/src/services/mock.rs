use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::verify::{ProviderError, VerifyProvider};
use crate::models::{Challenge, ChallengeStatus, Factor, FactorBinding, FactorStatus};

#[derive(Debug, Clone)]
struct StoredFactor {
    identity: String,
    entity_sid: String,
    friendly_name: String,
    status: FactorStatus,
}

/// In-memory provider. Any factor accepts exactly `accepted_code`, which
/// stands in for "the current TOTP code" in tests and offline demos.
pub struct MockVerifyProvider {
    accepted_code: String,
    factors: Mutex<HashMap<String, StoredFactor>>,
}

impl MockVerifyProvider {
    pub fn new(accepted_code: impl Into<String>) -> Self {
        Self {
            accepted_code: accepted_code.into(),
            factors: Mutex::new(HashMap::new()),
        }
    }

    /// Number of factors created so far.
    pub fn factor_count(&self) -> usize {
        self.factors.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// The last friendly name submitted for `factor_sid`.
    pub fn friendly_name(&self, factor_sid: &str) -> Option<String> {
        self.factors
            .lock()
            .ok()?
            .get(factor_sid)
            .map(|f| f.friendly_name.clone())
    }

    fn lookup(&self, identity: &str, factor_sid: &str) -> Result<StoredFactor, ProviderError> {
        let factors = self.lock()?;
        factors
            .get(factor_sid)
            .filter(|f| f.identity == identity)
            .cloned()
            .ok_or_else(|| not_found(factor_sid))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredFactor>>, ProviderError> {
        self.factors
            .lock()
            .map_err(|e| ProviderError::Unavailable(format!("mock factor store poisoned: {}", e)))
    }
}

fn new_sid(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

fn not_found(factor_sid: &str) -> ProviderError {
    ProviderError::Api {
        status: 404,
        code: Some(20404),
        message: format!("The requested resource /Factors/{} was not found", factor_sid),
        more_info: Some("https://www.twilio.com/docs/errors/20404".to_string()),
    }
}

fn factor_record(sid: &str, stored: &StoredFactor, binding: Option<FactorBinding>) -> Factor {
    let mut extra = Map::new();
    extra.insert("factor_type".to_string(), json!("totp"));
    extra.insert("friendly_name".to_string(), json!(stored.friendly_name));

    Factor {
        sid: sid.to_string(),
        entity_sid: Some(stored.entity_sid.clone()),
        identity: stored.identity.clone(),
        binding,
        status: stored.status.clone(),
        config: Some(json!({
            "alg": "sha1",
            "code_length": 6,
            "skew": 1,
            "time_step": 30
        })),
        extra,
    }
}

#[async_trait]
impl VerifyProvider for MockVerifyProvider {
    async fn create_factor(
        &self,
        identity: &str,
        friendly_name: &str,
    ) -> Result<Factor, ProviderError> {
        let sid = new_sid("YF");
        let secret = Uuid::new_v4().simple().to_string().to_uppercase();
        let stored = StoredFactor {
            identity: identity.to_string(),
            entity_sid: new_sid("YE"),
            friendly_name: friendly_name.to_string(),
            status: FactorStatus::Unverified,
        };

        let binding = FactorBinding {
            uri: format!(
                "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm=SHA1&digits=6&period=30",
                urlencoding::encode(friendly_name),
                urlencoding::encode(identity),
                secret,
                urlencoding::encode(friendly_name)
            ),
            secret,
            extra: Map::new(),
        };

        let factor = factor_record(&sid, &stored, Some(binding));
        self.lock()?.insert(sid, stored);
        Ok(factor)
    }

    async fn verify_factor(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<Factor, ProviderError> {
        let mut stored = self.lookup(identity, factor_sid)?;

        if code == self.accepted_code {
            stored.status = FactorStatus::Verified;
            self.lock()?.insert(factor_sid.to_string(), stored.clone());
        }

        Ok(factor_record(factor_sid, &stored, None))
    }

    async fn create_challenge(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<Challenge, ProviderError> {
        let stored = self.lookup(identity, factor_sid)?;

        if stored.status != FactorStatus::Verified {
            return Err(ProviderError::Api {
                status: 400,
                code: None,
                message: format!("Factor {} is not verified", factor_sid),
                more_info: None,
            });
        }

        let status = if code == self.accepted_code {
            ChallengeStatus::Approved
        } else {
            ChallengeStatus::Denied
        };

        let mut extra = Map::new();
        extra.insert("entity_sid".to_string(), Value::String(stored.entity_sid));
        extra.insert("factor_type".to_string(), json!("totp"));

        Ok(Challenge {
            sid: new_sid("YC"),
            status,
            identity: stored.identity,
            factor_sid: Some(factor_sid.to_string()),
            extra,
        })
    }
}
