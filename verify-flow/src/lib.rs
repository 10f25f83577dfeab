pub mod config;
pub mod error;
pub mod flow;
pub mod models;
pub mod services;
pub mod terminal;
pub mod utils;

pub use error::FlowError;
pub use flow::{FlowController, FlowEvent, FlowState, InvalidTransition, Phase};
pub use services::{GatewayApi, GatewayClient};
