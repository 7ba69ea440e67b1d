//! Token generation
//!
//! A token is a fixed prefix followed by 32 bytes from the OS random source,
//! URL-safe base64 without padding. Logs only ever carry a fingerprint.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;
const FINGERPRINT_LEN: usize = 12;

/// Generate an unguessable token carrying `prefix`
pub fn generate_token(prefix: &str) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{}{}", prefix, URL_SAFE_NO_PAD.encode(bytes))
}

/// Short SHA-256 digest of a token, safe to log
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}
