//! The three-phase enrollment state machine.
//!
//! The factor lives inside the `Register` and `Authenticate` variants, so a
//! verify or challenge step can never run without one.

use std::fmt;
use thiserror::Error;

use crate::models::{ChallengeResult, Factor, VerificationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Register,
    Authenticate,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Setup, Phase::Register, Phase::Authenticate];

    /// 1-based position in the progress indicator.
    pub fn step(self) -> u8 {
        match self {
            Phase::Setup => 1,
            Phase::Register => 2,
            Phase::Authenticate => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Phase::Setup => "Setup",
            Phase::Register => "Register",
            Phase::Authenticate => "Authenticate",
        }
    }

    /// Whether this step shows as done while the flow is at `current`.
    /// The last step is never marked done.
    pub fn is_completed(self, current: Phase) -> bool {
        current.step() > self.step()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    Setup,
    Register {
        factor: Factor,
        verify_result: Option<VerificationResult>,
    },
    Authenticate {
        factor: Factor,
        verify_result: Option<VerificationResult>,
        challenge_result: Option<ChallengeResult>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    FactorCreated(Factor),
    /// Verification came back with status `verified`.
    FactorVerified(VerificationResult),
    /// Verification came back with any other status.
    VerificationPending(VerificationResult),
    /// Approved or denied.
    ChallengeCompleted(ChallengeResult),
    Reset,
}

impl FlowEvent {
    /// Classifies a verify-factor response.
    pub fn verification(result: VerificationResult) -> Self {
        if result.is_verified() {
            FlowEvent::FactorVerified(result)
        } else {
            FlowEvent::VerificationPending(result)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::FactorCreated(_) => "FactorCreated",
            FlowEvent::FactorVerified(_) => "FactorVerified",
            FlowEvent::VerificationPending(_) => "VerificationPending",
            FlowEvent::ChallengeCompleted(_) => "ChallengeCompleted",
            FlowEvent::Reset => "Reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{event} is not valid during {from}")]
pub struct InvalidTransition {
    pub from: Phase,
    pub event: &'static str,
}

impl FlowState {
    pub fn phase(&self) -> Phase {
        match self {
            FlowState::Setup => Phase::Setup,
            FlowState::Register { .. } => Phase::Register,
            FlowState::Authenticate { .. } => Phase::Authenticate,
        }
    }

    pub fn transition(self, event: FlowEvent) -> Result<FlowState, InvalidTransition> {
        match (self, event) {
            (_, FlowEvent::Reset) => Ok(FlowState::Setup),

            (FlowState::Setup, FlowEvent::FactorCreated(factor)) => Ok(FlowState::Register {
                factor,
                verify_result: None,
            }),

            (FlowState::Register { factor, .. }, FlowEvent::VerificationPending(result)) => {
                Ok(FlowState::Register {
                    factor,
                    verify_result: Some(result),
                })
            }

            (FlowState::Register { factor, .. }, FlowEvent::FactorVerified(result)) => {
                Ok(FlowState::Authenticate {
                    factor,
                    verify_result: Some(result),
                    challenge_result: None,
                })
            }

            (
                FlowState::Authenticate {
                    factor,
                    verify_result,
                    ..
                },
                FlowEvent::ChallengeCompleted(result),
            ) => Ok(FlowState::Authenticate {
                factor,
                verify_result,
                challenge_result: Some(result),
            }),

            (state, event) => Err(InvalidTransition {
                from: state.phase(),
                event: event.name(),
            }),
        }
    }

    pub fn factor(&self) -> Option<&Factor> {
        match self {
            FlowState::Setup => None,
            FlowState::Register { factor, .. } | FlowState::Authenticate { factor, .. } => {
                Some(factor)
            }
        }
    }

    pub fn verify_result(&self) -> Option<&VerificationResult> {
        match self {
            FlowState::Setup => None,
            FlowState::Register { verify_result, .. }
            | FlowState::Authenticate { verify_result, .. } => verify_result.as_ref(),
        }
    }

    pub fn challenge_result(&self) -> Option<&ChallengeResult> {
        match self {
            FlowState::Authenticate {
                challenge_result, ..
            } => challenge_result.as_ref(),
            _ => None,
        }
    }

    /// Drops the previous challenge outcome before a new attempt.
    pub(crate) fn clear_challenge_result(&mut self) {
        if let FlowState::Authenticate {
            challenge_result, ..
        } = self
        {
            *challenge_result = None;
        }
    }
}
