mod controller;
mod state;

pub use controller::FlowController;
pub use state::{FlowEvent, FlowState, InvalidTransition, Phase};
