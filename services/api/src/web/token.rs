//! services/api/src/web/token.rs
//!
//! Signed session tokens. A token carries the user id and a one-day expiry;
//! it travels back to us in an HttpOnly cookie or a bearer header.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use notes_core::ports::{PortError, PortResult};

const TOKEN_TTL_HOURS: i64 = 24;

/// Cookie lifetime matches the token lifetime.
pub const COOKIE_MAX_AGE_SECONDS: i64 = TOKEN_TTL_HOURS * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    exp: i64,
}

/// Signs a session token for `user_id`.
pub fn create_token(user_id: Uuid, secret: &str) -> PortResult<String> {
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| PortError::Unexpected(format!("Failed to sign session token: {}", e)))
}

/// Verifies a session token and returns the user id it was issued for.
/// Expired or tampered tokens are `Unauthorized`.
pub fn verify_token(token: &str, secret: &str) -> PortResult<Uuid> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| PortError::Unauthorized)?;
    Ok(data.claims.sub)
}
