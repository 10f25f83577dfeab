//! Drives one user through create → verify → challenge.
//!
//! Every step clears the previous error, validates locally, makes one gateway
//! call and applies the result to the state machine. Failures are recorded
//! in `error()` and returned; the phase never changes on failure.

use super::state::{FlowEvent, FlowState, Phase};
use crate::error::FlowError;
use crate::models::{ChallengeResult, Factor, VerificationResult};
use crate::services::GatewayApi;
use crate::utils::{
    is_valid_code, sanitize_code, sanitize_identity, validate_code, validate_identity,
    IDENTITY_MIN_LEN,
};

pub struct FlowController<G> {
    gateway: G,
    state: FlowState,
    identity: String,
    friendly_name: String,
    verify_code: String,
    challenge_code: String,
    error: Option<String>,
}

impl<G: GatewayApi> FlowController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: FlowState::Setup,
            identity: String::new(),
            friendly_name: String::new(),
            verify_code: String::new(),
            challenge_code: String::new(),
            error: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn verify_code(&self) -> &str {
        &self.verify_code
    }

    pub fn challenge_code(&self) -> &str {
        &self.challenge_code
    }

    pub fn factor(&self) -> Option<&Factor> {
        self.state.factor()
    }

    pub fn verify_result(&self) -> Option<&VerificationResult> {
        self.state.verify_result()
    }

    pub fn challenge_result(&self) -> Option<&ChallengeResult> {
        self.state.challenge_result()
    }

    /// Message of the last failed step, if the latest step failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_identity(&mut self, raw: &str) {
        self.identity = sanitize_identity(raw);
    }

    pub fn set_friendly_name(&mut self, name: &str) {
        self.friendly_name = name.to_string();
    }

    pub fn set_verify_code(&mut self, raw: &str) {
        self.verify_code = sanitize_code(raw);
    }

    pub fn set_challenge_code(&mut self, raw: &str) {
        self.challenge_code = sanitize_code(raw);
    }

    pub fn can_create_factor(&self) -> bool {
        self.phase() == Phase::Setup && self.identity.len() >= IDENTITY_MIN_LEN
    }

    pub fn can_verify(&self) -> bool {
        self.phase() == Phase::Register && is_valid_code(&self.verify_code)
    }

    pub fn can_challenge(&self) -> bool {
        self.phase() == Phase::Authenticate && is_valid_code(&self.challenge_code)
    }

    /// Create an unverified TOTP factor and move to `Register`.
    pub async fn create_factor(
        &mut self,
        identity: &str,
        friendly_name: &str,
    ) -> Result<Factor, FlowError> {
        self.error = None;

        let outcome = self.submit_factor(identity, friendly_name).await;
        self.record(outcome)
    }

    async fn submit_factor(
        &mut self,
        identity: &str,
        friendly_name: &str,
    ) -> Result<Factor, FlowError> {
        // The inputs of a held factor stay as they were.
        self.expect_phase(Phase::Setup)?;
        self.set_identity(identity);
        self.set_friendly_name(friendly_name);
        validate_identity(&self.identity)?;

        let friendly_name = Some(self.friendly_name.trim()).filter(|name| !name.is_empty());
        let factor = self
            .gateway
            .create_factor(&self.identity, friendly_name)
            .await?;

        tracing::info!(factor_sid = %factor.factor_sid, status = ?factor.status, "Factor created");
        self.apply(FlowEvent::FactorCreated(factor.clone()))?;
        Ok(factor)
    }

    /// Submit the first code from the authenticator app. Moves to
    /// `Authenticate` only when the factor comes back verified.
    pub async fn verify_factor(&mut self, code: &str) -> Result<VerificationResult, FlowError> {
        self.error = None;

        let outcome = self.submit_verification(code).await;
        self.record(outcome)
    }

    async fn submit_verification(&mut self, code: &str) -> Result<VerificationResult, FlowError> {
        self.expect_phase(Phase::Register)?;
        self.set_verify_code(code);
        validate_code(&self.verify_code)?;

        let factor = self.held_factor()?;
        let result = self
            .gateway
            .verify_factor(&factor.identity, &factor.factor_sid, &self.verify_code)
            .await?;

        tracing::info!(status = ?result.status(), "Factor verification submitted");
        self.apply(FlowEvent::verification(result.clone()))?;
        Ok(result)
    }

    /// Authenticate with a code. A denied challenge is a result, not an error.
    pub async fn challenge(&mut self, code: &str) -> Result<ChallengeResult, FlowError> {
        self.error = None;
        self.state.clear_challenge_result();

        let outcome = self.submit_challenge(code).await;
        self.record(outcome)
    }

    async fn submit_challenge(&mut self, code: &str) -> Result<ChallengeResult, FlowError> {
        self.expect_phase(Phase::Authenticate)?;
        self.set_challenge_code(code);
        validate_code(&self.challenge_code)?;

        let factor = self.held_factor()?;
        let result = self
            .gateway
            .challenge(&factor.identity, &factor.factor_sid, &self.challenge_code)
            .await?;

        tracing::info!(status = ?result.status(), "Challenge completed");
        self.apply(FlowEvent::ChallengeCompleted(result.clone()))?;
        Ok(result)
    }

    /// Back to `Setup` with every input and result cleared.
    pub fn reset(&mut self) {
        self.state = FlowState::Setup;
        self.identity.clear();
        self.friendly_name.clear();
        self.verify_code.clear();
        self.challenge_code.clear();
        self.error = None;
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), FlowError> {
        let actual = self.phase();
        if actual == expected {
            Ok(())
        } else {
            Err(FlowError::WrongPhase { expected, actual })
        }
    }

    fn held_factor(&self) -> Result<Factor, FlowError> {
        self.state.factor().cloned().ok_or(FlowError::WrongPhase {
            expected: Phase::Register,
            actual: self.phase(),
        })
    }

    fn apply(&mut self, event: FlowEvent) -> Result<(), FlowError> {
        let from = self.phase();
        self.state = self.state.clone().transition(event)?;

        if from != self.phase() {
            tracing::info!(from = %from, to = %self.phase(), "Flow advanced");
        }
        Ok(())
    }

    fn record<T>(&mut self, outcome: Result<T, FlowError>) -> Result<T, FlowError> {
        if let Err(e) = &outcome {
            match e {
                FlowError::Gateway(_) | FlowError::Transport(_) => {
                    tracing::warn!(error = %e, phase = %self.phase(), "Flow step failed")
                }
                _ => tracing::debug!(error = %e, phase = %self.phase(), "Flow step rejected"),
            }
            self.error = Some(e.to_string());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Gateway that must never be reached.
    struct Unreachable;

    #[async_trait]
    impl GatewayApi for Unreachable {
        async fn create_factor(&self, _: &str, _: Option<&str>) -> Result<Factor, FlowError> {
            panic!("create_factor should not be called");
        }

        async fn verify_factor(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<VerificationResult, FlowError> {
            panic!("verify_factor should not be called");
        }

        async fn challenge(&self, _: &str, _: &str, _: &str) -> Result<ChallengeResult, FlowError> {
            panic!("challenge should not be called");
        }
    }

    #[tokio::test]
    async fn short_identity_never_reaches_gateway() {
        let mut flow = FlowController::new(Unreachable);

        let err = flow.create_factor("user-1", "").await.unwrap_err();

        assert!(matches!(err, FlowError::InvalidInput(_)));
        assert_eq!(flow.phase(), Phase::Setup);
        assert_eq!(flow.error(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn steps_out_of_phase_are_rejected() {
        let mut flow = FlowController::new(Unreachable);

        let err = flow.verify_factor("123456").await.unwrap_err();
        assert_eq!(
            err,
            FlowError::WrongPhase {
                expected: Phase::Register,
                actual: Phase::Setup
            }
        );

        let err = flow.challenge("123456").await.unwrap_err();
        assert!(matches!(err, FlowError::WrongPhase { .. }));
        assert!(flow.error().is_some());
        assert!(flow.verify_code().is_empty());
        assert!(flow.challenge_code().is_empty());
    }

    #[test]
    fn inputs_are_sanitized_and_gate_actions() {
        let mut flow = FlowController::new(Unreachable);

        flow.set_identity("user 12");
        assert_eq!(flow.identity(), "user12");
        assert!(!flow.can_create_factor());

        flow.set_identity("user-1234");
        assert!(flow.can_create_factor());

        flow.set_verify_code("12a34b56789");
        assert_eq!(flow.verify_code(), "123456");
        // Still in setup
        assert!(!flow.can_verify());
    }

    #[test]
    fn reset_clears_inputs() {
        let mut flow = FlowController::new(Unreachable);
        flow.set_identity("user-1234");
        flow.set_friendly_name("Laptop");
        flow.set_challenge_code("654321");
        flow.state = FlowState::Register {
            factor: serde_json::from_value(json!({
                "factorSid": "YF1",
                "identity": "user-1234"
            }))
            .unwrap(),
            verify_result: None,
        };

        flow.reset();
        flow.reset();

        assert_eq!(flow.phase(), Phase::Setup);
        assert!(flow.identity().is_empty());
        assert!(flow.friendly_name().is_empty());
        assert!(flow.challenge_code().is_empty());
        assert!(flow.factor().is_none());
        assert!(flow.error().is_none());
    }
}
