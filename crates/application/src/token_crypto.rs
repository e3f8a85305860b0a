use std::fmt::Write;

use sha2::{Digest, Sha256};
use tessera_core::{AppError, AppResult};

/// Hex length of a 256-bit secret.
pub(crate) const RAW_TOKEN_LEN: usize = 64;

/// Generates a 256-bit random secret and its SHA-256 hash.
///
/// Returns `(raw_token_hex, sha256_hash_hex)`.
pub(crate) fn generate_token() -> AppResult<(String, String)> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate token: {error}")))?;

    let raw_token = to_hex(&bytes);
    let hash = hash_token(&raw_token);
    Ok((raw_token, hash))
}

/// Computes the SHA-256 hash of a raw secret for storage and lookup.
pub(crate) fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    to_hex(&hasher.finalize())
}

/// Whether `raw_token` has the shape of a generated secret.
pub(crate) fn is_well_formed(raw_token: &str) -> bool {
    raw_token.len() == RAW_TOKEN_LEN
        && raw_token
            .bytes()
            .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
