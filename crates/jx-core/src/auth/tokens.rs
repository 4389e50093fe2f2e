//! Access and refresh token primitives.
//!
//! Access tokens are short-lived HS256 JWTs carrying the account identity.
//! Refresh tokens are opaque random strings held server-side so they can be
//! revoked and rotated; nothing is encoded in them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::domain::User;

const REFRESH_TOKEN_BYTES: usize = 64;

/// Signing and lifetime settings for both token kinds.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl TokenSettings {
    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign access token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("invalid access token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_access_token(
    settings: &TokenSettings,
    user: &User,
    now: DateTime<Utc>,
) -> Result<IssuedAccessToken, TokenError> {
    let expires_at = now + Duration::minutes(settings.access_ttl_minutes);
    let claims = AccessClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.full_name.clone(),
        role: user.role.as_str().to_string(),
        jti: Ulid::new().to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        iss: settings.issuer.clone(),
        aud: settings.audience.clone(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(TokenError::Encode)?;
    Ok(IssuedAccessToken { token, expires_at })
}

fn base_validation(settings: &TokenSettings) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&settings.issuer]);
    validation.set_audience(&[&settings.audience]);
    validation
}

pub fn decode_access_token(
    settings: &TokenSettings,
    token: &str,
) -> Result<AccessClaims, TokenError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &base_validation(settings),
    )
    .map(|data| data.claims)
    .map_err(TokenError::Decode)
}

/// Decode without checking `exp`. The refresh flow accepts the expired
/// access token as proof of which account is asking; signature, issuer and
/// audience are still enforced.
pub fn decode_access_token_ignoring_expiry(
    settings: &TokenSettings,
    token: &str,
) -> Result<AccessClaims, TokenError> {
    let mut validation = base_validation(settings);
    validation.validate_exp = false;
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(TokenError::Decode)
}

/// 64 random bytes from the OS, base64-encoded.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use crate::domain::Role;

    use super::*;

    fn settings(access_ttl_minutes: i64) -> TokenSettings {
        TokenSettings {
            secret: "unit-test-secret".to_string(),
            issuer: "jx-api".to_string(),
            audience: "jx-clients".to_string(),
            access_ttl_minutes,
            refresh_ttl_days: 30,
        }
    }

    fn sample_user() -> User {
        User {
            id: 42,
            email: "dev@example.com".to_string(),
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            full_name: "Dev Example".to_string(),
            phone_number: None,
            avatar_url: None,
            cv_url: None,
            skills: None,
            bio: None,
            role: Role::Applicant,
            is_active: true,
            verify_key: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn issued_token_decodes_to_its_claims() {
        let settings = settings(15);
        let now = Utc::now();
        let issued = issue_access_token(&settings, &sample_user(), now).unwrap();

        let claims = decode_access_token(&settings, &issued.token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "dev@example.com");
        assert_eq!(claims.name, "Dev Example");
        assert_eq!(claims.role, "Applicant");
        assert_eq!(claims.iss, "jx-api");
        assert_eq!(claims.aud, "jx-clients");
        assert!(!claims.jti.is_empty());
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert!(claims.iat <= claims.exp);
    }

    #[test]
    fn expired_token_is_rejected_unless_expiry_is_ignored() {
        let settings = settings(-5);
        let issued = issue_access_token(&settings, &sample_user(), Utc::now()).unwrap();

        assert!(decode_access_token(&settings, &issued.token).is_err());
        let claims = decode_access_token_ignoring_expiry(&settings, &issued.token).unwrap();
        assert_eq!(claims.sub, "42");
    }

    #[test]
    fn wrong_audience_or_secret_is_rejected() {
        let settings = settings(15);
        let issued = issue_access_token(&settings, &sample_user(), Utc::now()).unwrap();

        let mut other_audience = settings.clone();
        other_audience.audience = "someone-else".to_string();
        assert!(decode_access_token(&other_audience, &issued.token).is_err());
        assert!(decode_access_token_ignoring_expiry(&other_audience, &issued.token).is_err());

        let mut other_secret = settings.clone();
        other_secret.secret = "another-secret".to_string();
        assert!(decode_access_token(&other_secret, &issued.token).is_err());
    }

    #[test]
    fn refresh_tokens_are_long_and_distinct() {
        let first = generate_refresh_token();
        let second = generate_refresh_token();
        // 64 bytes of entropy encode to 88 base64 characters.
        assert_eq!(first.len(), 88);
        assert_ne!(first, second);
    }
}
