use secrecy::ExposeSecret;
use serial_test::serial;
use service_core::config::Config;
use service_core::error::AppError;
use std::collections::HashMap;
use verify_gateway::config::{GatewayConfig, ProviderConfig};

fn from_vars(vars: &[(&str, &str)]) -> Result<GatewayConfig, AppError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    GatewayConfig::from_lookup(Config::default(), |key| vars.get(key).cloned())
}

const TWILIO_VARS: [(&str, &str); 3] = [
    ("TWILIO_ACCOUNT_SID", "AC_test"),
    ("TWILIO_AUTH_TOKEN", "token"),
    ("TWILIO_VERIFY_SERVICE_SID", "VA_test"),
];

#[test]
fn twilio_is_the_default_provider() {
    let config = from_vars(&TWILIO_VARS).unwrap();

    match &config.provider {
        ProviderConfig::Twilio(twilio) => {
            assert_eq!(twilio.account_sid, "AC_test");
            assert_eq!(twilio.auth_token.expose_secret(), "token");
            assert_eq!(twilio.verify_service_sid, "VA_test");
            assert_eq!(twilio.api_base_url, "https://verify.twilio.com/v2");
        }
        other => panic!("unexpected provider: {:?}", other),
    }

    assert_eq!(config.common.port, 4000);
    assert_eq!(config.service_name, "verify-gateway");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.factor.default_friendly_name, "ACME Account");
    assert_eq!(config.security.allowed_origins, vec!["*".to_string()]);
    assert!(config.otlp_endpoint.is_none());
}

#[test]
fn missing_credentials_are_rejected() {
    for missing in 0..TWILIO_VARS.len() {
        let vars: Vec<_> = TWILIO_VARS
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != missing)
            .map(|(_, kv)| *kv)
            .collect();

        let err = from_vars(&vars).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains(TWILIO_VARS[missing].0));
    }
}

#[test]
fn empty_values_count_as_missing() {
    let err = from_vars(&[
        ("TWILIO_ACCOUNT_SID", ""),
        ("TWILIO_AUTH_TOKEN", "token"),
        ("TWILIO_VERIFY_SERVICE_SID", "VA_test"),
    ])
    .unwrap_err();

    assert!(matches!(err, AppError::ConfigError(_)));
}

#[test]
fn mock_provider_needs_no_credentials() {
    let config = from_vars(&[("VERIFY_PROVIDER", "MOCK")]).unwrap();
    assert!(matches!(
        config.provider,
        ProviderConfig::Mock { ref accepted_code } if accepted_code == "123456"
    ));
}

#[test]
fn unknown_provider_is_rejected() {
    let err = from_vars(&[("VERIFY_PROVIDER", "carrier-pigeon")]).unwrap_err();
    assert!(matches!(err, AppError::ConfigError(_)));
}

#[test]
fn overrides_are_applied() {
    let mut vars = TWILIO_VARS.to_vec();
    vars.extend([
        ("VERIFY_API_BASE_URL", "http://localhost:9999/v2"),
        ("FACTOR_FRIENDLY_NAME", "Example Corp"),
        ("ALLOWED_ORIGINS", "http://localhost:5173, https://app.example.com,"),
        ("OTLP_ENDPOINT", "http://localhost:4317"),
        ("LOG_LEVEL", "debug"),
    ]);

    let config = from_vars(&vars).unwrap();

    assert_eq!(config.factor.default_friendly_name, "Example Corp");
    assert_eq!(
        config.security.allowed_origins,
        vec![
            "http://localhost:5173".to_string(),
            "https://app.example.com".to_string()
        ]
    );
    assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
    assert_eq!(config.log_level, "debug");
}

#[test]
fn non_http_base_url_is_rejected() {
    let mut vars = TWILIO_VARS.to_vec();
    vars.push(("VERIFY_API_BASE_URL", "verify.twilio.com/v2"));

    assert!(matches!(
        from_vars(&vars).unwrap_err(),
        AppError::ConfigError(_)
    ));
}

#[test]
#[serial]
fn port_is_read_from_environment() {
    std::env::set_var("PORT", "4123");
    let config = Config::load();
    std::env::remove_var("PORT");

    assert_eq!(config.unwrap().port, 4123);
}

#[test]
#[serial]
fn port_defaults_when_unset() {
    std::env::remove_var("PORT");
    assert_eq!(Config::load().unwrap().port, 4000);
}
