use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Number of random bytes behind every generated short code.
pub const CODE_BYTES: usize = 6;

/// Route segments that a caller-supplied code may not shadow.
const RESERVED_CODES: &[&str] = &["api", "analytics"];

/// Generate a random short code: six random bytes, base64url encoded.
///
/// Uniqueness is not checked here; the storage layer rejects duplicates.
pub fn generate_code() -> String {
    let bytes: [u8; CODE_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Check a caller-supplied short code, returning a message on rejection.
pub fn validate_code(code: &str, max_length: usize) -> Result<(), String> {
    if code.is_empty() || code.chars().count() > max_length {
        return Err(format!("short URL must be 1-{max_length} characters"));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("short URL may only contain letters, digits, '-' and '_'".to_string());
    }

    if RESERVED_CODES.iter().any(|r| r.eq_ignore_ascii_case(code)) {
        return Err(format!("'{code}' is reserved, please choose another short URL"));
    }

    Ok(())
}
