use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

const KEY_BYTES: usize = 32;

/// Generate a new API key. It is returned once and never stored.
pub fn generate_api_key() -> String {
    let bytes: [u8; KEY_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest under which a key is stored and looked up.
pub fn hash_api_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}
