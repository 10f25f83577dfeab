use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_FRIENDLY_NAME: &str = "ACME Account";
pub const DEFAULT_VERIFY_API_BASE_URL: &str = "https://verify.twilio.com/v2";
pub const DEFAULT_MOCK_TOTP_CODE: &str = "123456";

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub provider: ProviderConfig,
    pub factor: FactorConfig,
    pub security: SecurityConfig,
}

/// Which verification backend the gateway talks to.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    Twilio(TwilioConfig),
    /// In-memory provider accepting a single fixed code. Offline demos only.
    Mock { accepted_code: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    pub verify_service_sid: String,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactorConfig {
    /// Used when the caller does not supply a friendly name.
    pub default_friendly_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: Option<&str>| get_env(&lookup, key, default);

        let provider_kind = var("VERIFY_PROVIDER", Some("twilio"))?;
        let provider = match provider_kind.to_lowercase().as_str() {
            "twilio" => ProviderConfig::Twilio(TwilioConfig {
                account_sid: var("TWILIO_ACCOUNT_SID", None)?,
                auth_token: Secret::new(var("TWILIO_AUTH_TOKEN", None)?),
                verify_service_sid: var("TWILIO_VERIFY_SERVICE_SID", None)?,
                api_base_url: var("VERIFY_API_BASE_URL", Some(DEFAULT_VERIFY_API_BASE_URL))?,
            }),
            "mock" => ProviderConfig::Mock {
                accepted_code: var("MOCK_TOTP_CODE", Some(DEFAULT_MOCK_TOTP_CODE))?,
            },
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Invalid VERIFY_PROVIDER: {}",
                    other
                )))
            }
        };

        let config = GatewayConfig {
            common,
            service_name: var("SERVICE_NAME", Some("verify-gateway"))?,
            service_version: var("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: var("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|s| !s.trim().is_empty()),
            provider,
            factor: FactorConfig {
                default_friendly_name: var(
                    "FACTOR_FRIENDLY_NAME",
                    Some(DEFAULT_FRIENDLY_NAME),
                )?,
            },
            security: SecurityConfig {
                allowed_origins: var("ALLOWED_ORIGINS", Some("*"))?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.factor.default_friendly_name.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "FACTOR_FRIENDLY_NAME must not be blank"
            )));
        }

        if let ProviderConfig::Twilio(twilio) = &self.provider {
            if !twilio.api_base_url.starts_with("http") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "VERIFY_API_BASE_URL must be an http(s) URL"
                )));
            }
        }

        Ok(())
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|val| !val.is_empty()) {
        Some(val) => Ok(val),
        None => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}
