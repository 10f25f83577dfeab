//! Input clean-up applied as the user types.
//!
//! These are advisory. The gateway accepts any non-empty identity, so the
//! charset policy only lives here.

pub const IDENTITY_MIN_LEN: usize = 8;
pub const IDENTITY_MAX_LEN: usize = 64;
pub const CODE_LENGTH: usize = 6;

/// Keep `[A-Za-z0-9-]`, capped at the maximum identity length.
pub fn sanitize_identity(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(IDENTITY_MAX_LEN)
        .collect()
}

/// Keep digits only, capped at the code length.
pub fn sanitize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(CODE_LENGTH)
        .collect()
}
