//! Shared helpers for flow integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use service_core::config::Config;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use verify_flow::models::{ChallengeResult, Factor, VerificationResult};
use verify_flow::{FlowError, GatewayApi};
use verify_gateway::{
    build_router,
    config::GatewayConfig,
    services::{MockVerifyProvider, VerifyProvider},
    AppState,
};

/// The code the spawned gateway accepts.
pub const VALID_CODE: &str = "246810";
pub const WRONG_CODE: &str = "135791";

/// A real gateway on a random local port, backed by the mock provider.
pub struct SpawnedGateway {
    pub base_url: String,
    pub provider: Arc<MockVerifyProvider>,
}

pub async fn spawn_gateway() -> SpawnedGateway {
    let vars = HashMap::from([
        ("VERIFY_PROVIDER", "mock"),
        ("MOCK_TOTP_CODE", VALID_CODE),
        ("SERVICE_NAME", "verify-gateway-e2e"),
    ]);
    let config = GatewayConfig::from_lookup(Config::default(), |key| {
        vars.get(key).map(|v| v.to_string())
    })
    .expect("Failed to build gateway config");

    let provider = Arc::new(MockVerifyProvider::new(VALID_CODE));
    let app = build_router(AppState::new(
        config,
        provider.clone() as Arc<dyn VerifyProvider>,
    ));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind gateway listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        service_core::axum::serve(listener, app)
            .await
            .expect("Gateway server failed");
    });

    SpawnedGateway {
        base_url: format!("http://{}/api", addr),
        provider,
    }
}

/// Scripted gateway that records every call.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: Mutex<Vec<String>>,
    pub create: Mutex<Option<Result<Factor, FlowError>>>,
    pub verify: Mutex<Vec<Result<VerificationResult, FlowError>>>,
    pub challenge: Mutex<Vec<Result<ChallengeResult, FlowError>>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn on_create(&self, result: Result<Factor, FlowError>) {
        *self.create.lock().unwrap() = Some(result);
    }

    /// Queued in call order.
    pub fn on_verify(&self, result: Result<VerificationResult, FlowError>) {
        self.verify.lock().unwrap().push(result);
    }

    pub fn on_challenge(&self, result: Result<ChallengeResult, FlowError>) {
        self.challenge.lock().unwrap().push(result);
    }
}

#[async_trait]
impl GatewayApi for FakeGateway {
    async fn create_factor(
        &self,
        identity: &str,
        friendly_name: Option<&str>,
    ) -> Result<Factor, FlowError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("create {} {:?}", identity, friendly_name));
        self.create
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(factor(identity)))
    }

    async fn verify_factor(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<VerificationResult, FlowError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("verify {} {} {}", identity, factor_sid, code));
        let mut queued = self.verify.lock().unwrap();
        if queued.is_empty() {
            Ok(verification("verified"))
        } else {
            queued.remove(0)
        }
    }

    async fn challenge(
        &self,
        identity: &str,
        factor_sid: &str,
        code: &str,
    ) -> Result<ChallengeResult, FlowError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("challenge {} {} {}", identity, factor_sid, code));
        let mut queued = self.challenge.lock().unwrap();
        if queued.is_empty() {
            Ok(challenge("approved"))
        } else {
            queued.remove(0)
        }
    }
}

pub fn factor(identity: &str) -> Factor {
    serde_json::from_value(json!({
        "factorSid": "YF0001",
        "entitySid": "YE0001",
        "identity": identity,
        "binding": {
            "secret": "GEZDGNBVGY3TQOJQ",
            "uri": "otpauth://totp/ACME%20Account:user-1234?secret=GEZDGNBVGY3TQOJQ"
        },
        "status": "unverified",
        "config": { "code_length": 6 }
    }))
    .unwrap()
}

pub fn verification(status: &str) -> VerificationResult {
    serde_json::from_value(json!({
        "sid": "YF0001",
        "status": status,
        "updated": { "sid": "YF0001", "status": status }
    }))
    .unwrap()
}

pub fn challenge(status: &str) -> ChallengeResult {
    serde_json::from_value(json!({
        "challengeSid": "YC0001",
        "status": status,
        "challenge": { "sid": "YC0001", "status": status }
    }))
    .unwrap()
}
