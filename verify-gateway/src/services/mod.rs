//! Verification provider implementations and the trait the handlers use.

mod mock;
mod twilio;
mod verify;

pub use mock::MockVerifyProvider;
pub use twilio::TwilioVerifyClient;
pub use verify::{ProviderError, VerifyProvider};

use std::sync::Arc;

use crate::config::ProviderConfig;

/// Build the provider once at startup; handlers share it through `AppState`.
pub fn build_provider(config: &ProviderConfig) -> Arc<dyn VerifyProvider> {
    match config {
        ProviderConfig::Twilio(twilio) => {
            tracing::info!(
                service_sid = %twilio.verify_service_sid,
                api_base_url = %twilio.api_base_url,
                "Twilio Verify client configured"
            );
            Arc::new(TwilioVerifyClient::new(twilio.clone()))
        }
        ProviderConfig::Mock { accepted_code } => {
            tracing::warn!("Using the in-memory verification provider; codes are not real TOTP");
            Arc::new(MockVerifyProvider::new(accepted_code.clone()))
        }
    }
}
