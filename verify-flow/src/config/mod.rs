use service_core::error::AppError;
use std::env;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:4000/api";

#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Base URL the three gateway paths are appended to.
    pub gateway_url: String,
    pub log_level: String,
}

impl FlowSettings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|val| !val.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let gateway_url = var("GATEWAY_URL", DEFAULT_GATEWAY_URL)
            .trim_end_matches('/')
            .to_string();

        if !gateway_url.starts_with("http") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATEWAY_URL must be an http(s) URL, got '{}'",
                gateway_url
            )));
        }

        Ok(Self {
            gateway_url,
            log_level: var("LOG_LEVEL", "warn"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_gateway() {
        let settings = FlowSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.gateway_url, "http://localhost:4000/api");
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn gateway_url_is_normalized() {
        let vars = HashMap::from([("GATEWAY_URL", "http://gateway:4000/api/")]);
        let settings =
            FlowSettings::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.gateway_url, "http://gateway:4000/api");
    }

    #[test]
    fn rejects_non_http_gateway_url() {
        let vars = HashMap::from([("GATEWAY_URL", "gateway:4000")]);
        let result = FlowSettings::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
