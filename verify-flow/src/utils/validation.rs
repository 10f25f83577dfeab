//! Rules a step's input must meet before it is sent to the gateway.

use std::borrow::Cow;

use service_core::error::validation_message;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::FlowError;

#[derive(Debug, Validate)]
pub struct IdentityInput {
    #[validate(length(min = 8, max = 64, message = "identity must be 8-64 characters"))]
    pub identity: String,
}

#[derive(Debug, Validate)]
pub struct CodeInput {
    #[validate(
        length(equal = 6, message = "code must be exactly 6 digits"),
        custom(function = "all_digits")
    )]
    pub code: String,
}

fn all_digits(code: &str) -> Result<(), ValidationError> {
    if code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    let mut err = ValidationError::new("digits");
    err.message = Some(Cow::Borrowed("code must be exactly 6 digits"));
    Err(err)
}

impl From<ValidationErrors> for FlowError {
    fn from(errors: ValidationErrors) -> Self {
        FlowError::InvalidInput(validation_message(&errors))
    }
}

pub fn validate_identity(identity: &str) -> Result<(), FlowError> {
    let input = IdentityInput {
        identity: identity.to_string(),
    };
    Ok(input.validate()?)
}

pub fn validate_code(code: &str) -> Result<(), FlowError> {
    let input = CodeInput {
        code: code.to_string(),
    };
    Ok(input.validate()?)
}

pub fn is_valid_code(code: &str) -> bool {
    validate_code(code).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_length_policy() {
        assert!(validate_identity("abcdefgh").is_ok());
        assert!(validate_identity(&"a".repeat(64)).is_ok());
        assert!(validate_identity(&"a".repeat(65)).is_err());

        for short in ["", "short"] {
            assert_eq!(
                validate_identity(short),
                Err(FlowError::InvalidInput(
                    "identity must be 8-64 characters".to_string()
                ))
            );
        }
    }

    #[test]
    fn identity_length_counts_characters() {
        assert!(validate_identity("üüüüüüüü").is_ok());
    }

    #[test]
    fn code_must_be_six_digits() {
        assert!(is_valid_code("123456"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("12345a"));

        for bad in ["1234567", "12345a", ""] {
            assert_eq!(
                validate_code(bad),
                Err(FlowError::InvalidInput(
                    "code must be exactly 6 digits".to_string()
                ))
            );
        }
    }
}
