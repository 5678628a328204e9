//! Bearer token issuing and validation.
//!
//! HS256 tokens carry the identity id and role. Buyers and sellers get
//! long-lived tokens, admins a 24-hour one; there is no refresh mechanism.

use std::sync::OnceLock;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::app_error::AppError;

pub const BUYER_TOKEN_DAYS: i64 = 30;
pub const SELLER_TOKEN_DAYS: i64 = 30;
pub const ADMIN_TOKEN_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id within the role's table.
    pub sub: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

static SECRET: OnceLock<Vec<u8>> = OnceLock::new();

/// Installs the signing key resolved by `config::load`. Called once during
/// bootstrap, before the server accepts requests.
pub fn init_secret(secret: &str) {
    let _ = SECRET.set(secret.as_bytes().to_vec());
}

fn secret() -> &'static [u8] {
    // Unit tests never run bootstrap; they sign and verify against the
    // development key. Production startup fails in config::load before any
    // token is issued without a configured secret.
    SECRET.get_or_init(|| b"medimart-development-only-secret-key".to_vec())
}

pub fn generate_token(id: i32, role: Role, lifetime: Duration) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: id,
        role,
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret()),
    )
    .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to sign token: {e}")))
}

pub fn decode_token(token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}

pub fn buyer_token(id: i32) -> Result<String, AppError> {
    generate_token(id, Role::Buyer, Duration::days(BUYER_TOKEN_DAYS))
}

pub fn seller_token(id: i32) -> Result<String, AppError> {
    generate_token(id, Role::Seller, Duration::days(SELLER_TOKEN_DAYS))
}

pub fn admin_token(id: i32) -> Result<String, AppError> {
    generate_token(id, Role::Admin, Duration::hours(ADMIN_TOKEN_HOURS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let token = buyer_token(42).unwrap();
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Buyer);
    }

    #[test]
    fn signing_and_verification_share_one_installed_key() {
        // Whichever key wins the one-time install, both sides use it.
        init_secret("configured-at-startup");
        let token = seller_token(5).unwrap();
        assert_eq!(decode_token(&token).unwrap().sub, 5);
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert!(decode_token("not-a-token").is_err());
    }

    #[test]
    fn rejects_expired_tokens() {
        let token = generate_token(1, Role::Admin, Duration::seconds(-120)).unwrap();
        assert!(decode_token(&token).is_err());
    }
}
