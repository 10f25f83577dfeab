pub mod sanitize;
pub mod validation;

pub use sanitize::{sanitize_code, sanitize_identity, CODE_LENGTH, IDENTITY_MAX_LEN, IDENTITY_MIN_LEN};
pub use validation::{is_valid_code, validate_code, validate_identity, CodeInput, IdentityInput};
