use thiserror::Error;

use crate::flow::{InvalidTransition, Phase};

/// Everything that can stop a flow step. `Display` is the message shown to
/// the user, so gateway messages are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("This step belongs to {expected}, but the flow is at {actual}")]
    WrongPhase { expected: Phase, actual: Phase },

    /// Non-2xx gateway response.
    #[error("{0}")]
    Gateway(String),

    /// The gateway could not be reached or answered with an unreadable body.
    #[error("{0}")]
    Transport(String),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}
