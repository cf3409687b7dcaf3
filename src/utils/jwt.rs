// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims this client cares about. The signature is the server's business;
/// the client only reads expiry and role to decide whether a stored token
/// is still worth sending.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration time as Unix timestamp.
    #[serde(default)]
    pub exp: Option<u64>,
}

/// Decodes the payload of a JWT without verifying its signature.
///
/// Returns `None` for opaque (non-JWT) tokens.
pub fn inspect(token: &str) -> Option<TokenClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

/// True when the token carries an `exp` claim that is not after `now`.
pub fn is_expired_at(token: &str, now: u64) -> bool {
    inspect(token)
        .and_then(|claims| claims.exp)
        .is_some_and(|exp| exp <= now)
}

pub fn is_expired(token: &str) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    is_expired_at(token, now)
}
