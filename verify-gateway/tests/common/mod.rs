//! Shared setup for gateway integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use service_core::config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt;
use verify_gateway::{
    build_router,
    config::GatewayConfig,
    services::{MockVerifyProvider, VerifyProvider},
    AppState,
};

/// The code the mock provider treats as the current TOTP code.
pub const VALID_CODE: &str = "246810";
pub const TEST_IDENTITY: &str = "user-1234";

pub fn test_config() -> GatewayConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("VERIFY_PROVIDER", "mock"),
        ("MOCK_TOTP_CODE", VALID_CODE),
        ("SERVICE_NAME", "verify-gateway-test"),
    ]);

    GatewayConfig::from_lookup(Config::default(), |key| {
        vars.get(key).map(|v| v.to_string())
    })
    .expect("Failed to build test config")
}

/// Router backed by a fresh mock provider.
pub struct TestApp {
    pub router: Router,
    pub provider: Arc<MockVerifyProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        let provider = Arc::new(MockVerifyProvider::new(VALID_CODE));
        let state = AppState::new(
            test_config(),
            provider.clone() as Arc<dyn VerifyProvider>,
        );

        Self {
            router: build_router(state),
            provider,
        }
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(path, body.to_string()).await
    }

    pub async fn post_raw(&self, path: &str, body: String) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Creates a factor and returns `(factorSid, identity)`.
    pub async fn create_factor(&self, identity: &str) -> (String, String) {
        let (status, body) = self
            .post_json(
                "/api/create-factor",
                serde_json::json!({ "identity": identity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create-factor failed: {}", body);

        (
            body["factorSid"].as_str().unwrap().to_string(),
            body["identity"].as_str().unwrap().to_string(),
        )
    }

    /// Creates and verifies a factor, returning its SID.
    pub async fn verified_factor(&self, identity: &str) -> String {
        let (factor_sid, identity) = self.create_factor(identity).await;
        let (status, body) = self
            .post_json(
                "/api/verify-factor",
                serde_json::json!({
                    "identity": identity,
                    "factorSid": factor_sid,
                    "code": VALID_CODE,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "verified");
        factor_sid
    }
}
