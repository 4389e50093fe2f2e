//! Account workflows: registration, password sign-in, refresh rotation, and
//! session revocation. Handlers call these instead of stitching storage and
//! crypto together themselves.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::api::auth::{AuthResponse, AuthUserInfo, LoginRequest, RefreshRequest, RegisterRequest};
use crate::auth::password::{self, PasswordError};
use crate::auth::tokens::{self, TokenError, TokenSettings};
use crate::auth::verify_key::{VerifyKeyCipher, VerifyKeyError};
use crate::db::refresh_tokens::TokenStorageError;
use crate::db::users::{NewUserRecord, UserStorageError};
use crate::db::{self, PgPool};
use crate::domain::{Role, User};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Identity proof length required at registration.
pub const VERIFY_KEY_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("this account has been deactivated")]
    AccountDisabled,
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("invalid or expired refresh token")]
    InvalidRefreshToken,
    #[error("password handling failed: {0}")]
    Password(#[from] PasswordError),
    #[error("token handling failed: {0}")]
    Token(#[from] TokenError),
    #[error("verify key handling failed: {0}")]
    VerifyKey(#[from] VerifyKeyError),
    #[error("user storage failed: {0}")]
    Storage(#[from] UserStorageError),
    #[error("token storage failed: {0}")]
    Tokens(#[from] TokenStorageError),
}

/// Field checks that need no database access. They run before any round
/// trip so a malformed payload is rejected the same way with or without a
/// reachable database.
fn validate_registration(request: &RegisterRequest) -> Result<Role, AuthFlowError> {
    if !EMAIL_RE.is_match(request.email.trim()) {
        return Err(AuthFlowError::Validation(
            "a valid email address is required".to_string(),
        ));
    }
    if request.password.chars().count() < 6 {
        return Err(AuthFlowError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    if request.password.len() > 72 {
        return Err(AuthFlowError::Validation(
            "password must be at most 72 characters".to_string(),
        ));
    }
    if request.password != request.confirm_password {
        return Err(AuthFlowError::Validation(
            "password confirmation does not match".to_string(),
        ));
    }

    let full_name = request.full_name.trim();
    if full_name.is_empty() || full_name.chars().count() > 100 {
        return Err(AuthFlowError::Validation(
            "full name is required and must stay under 100 characters".to_string(),
        ));
    }

    let role = Role::parse(request.role.trim())
        .filter(Role::is_registerable)
        .ok_or_else(|| {
            AuthFlowError::Validation("role must be Applicant or Employer".to_string())
        })?;

    let verify_key = request.verify_key.trim();
    let starts_with_digit = verify_key.chars().next().is_some_and(|c| c.is_ascii_digit());
    if verify_key.chars().count() != VERIFY_KEY_LEN || !starts_with_digit {
        return Err(AuthFlowError::Validation(format!(
            "verify key must be {VERIFY_KEY_LEN} characters and start with a digit"
        )));
    }

    Ok(role)
}

/// Create an account and sign its first session in.
#[instrument(skip(pool, settings, cipher, request))]
pub async fn register(
    pool: &PgPool,
    settings: &TokenSettings,
    cipher: &VerifyKeyCipher,
    request: &RegisterRequest,
) -> Result<AuthResponse, AuthFlowError> {
    let role = validate_registration(request)?;

    let email = request.email.trim().to_lowercase();
    if db::fetch_user_by_email(pool, &email).await?.is_some() {
        return Err(AuthFlowError::EmailTaken(email));
    }

    let password_hash = password::hash_password(&request.password, None).await?;
    let verify_key = cipher.encrypt(request.verify_key.trim())?;

    let record = NewUserRecord {
        email,
        password_hash,
        full_name: request.full_name.trim().to_string(),
        phone_number: request.phone_number.clone(),
        role,
        verify_key: Some(verify_key),
    };
    let user = match db::insert_user(pool, &record, Utc::now()).await {
        Ok(user) => user,
        // Lost the race against a concurrent registration for the same email.
        Err(UserStorageError::Conflict(_)) => return Err(AuthFlowError::EmailTaken(record.email)),
        Err(err) => return Err(err.into()),
    };

    info!(user_id = user.id, role = %user.role, "account registered");
    issue_token_pair(pool, settings, &user).await
}

/// Password sign-in. `remember_me = false` keeps a single live session by
/// revoking the user's other refresh tokens first.
#[instrument(skip(pool, settings, request))]
pub async fn login(
    pool: &PgPool,
    settings: &TokenSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AuthFlowError> {
    let email = request.email.trim().to_lowercase();
    let Some(user) = db::fetch_user_by_email(pool, &email).await? else {
        return Err(AuthFlowError::InvalidCredentials);
    };
    if !password::verify_password(&request.password, &user.password_hash).await? {
        return Err(AuthFlowError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AuthFlowError::AccountDisabled);
    }

    if !request.remember_me {
        let revoked = db::revoke_all_for_user(pool, user.id, Utc::now()).await?;
        if revoked > 0 {
            info!(user_id = user.id, revoked, "revoked previous sessions on login");
        }
    }

    issue_token_pair(pool, settings, &user).await
}

/// Rotate a refresh token: check the stored pair, revoke what was presented,
/// and hand out a fresh pair. The access token is decoded without its expiry
/// check since rotation is exactly what an expired one is for.
#[instrument(skip(pool, settings, request))]
pub async fn refresh(
    pool: &PgPool,
    settings: &TokenSettings,
    request: &RefreshRequest,
) -> Result<AuthResponse, AuthFlowError> {
    let claims = tokens::decode_access_token_ignoring_expiry(settings, &request.access_token)
        .map_err(|_| AuthFlowError::InvalidRefreshToken)?;
    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AuthFlowError::InvalidRefreshToken)?;

    let stored = db::fetch_refresh_token(pool, user_id, &request.refresh_token).await?;
    let Some(stored) = stored else {
        warn!(user_id, "refresh token not found");
        return Err(AuthFlowError::InvalidRefreshToken);
    };

    let now = Utc::now();
    if !stored.is_usable(now) {
        warn!(
            user_id,
            is_revoked = stored.is_revoked,
            expires_at = %stored.expires_at,
            "refresh token no longer usable"
        );
        return Err(AuthFlowError::InvalidRefreshToken);
    }

    let Some(user) = db::fetch_user_by_id(pool, user_id).await? else {
        warn!(user_id, "refresh token for a deleted account");
        return Err(AuthFlowError::InvalidRefreshToken);
    };

    db::revoke_refresh_token(pool, &stored.token, now).await?;
    issue_token_pair(pool, settings, &user).await
}

/// Log a session out. Returns whether a live token was actually revoked.
#[instrument(skip(pool, token))]
pub async fn revoke(pool: &PgPool, token: &str) -> Result<bool, AuthFlowError> {
    let revoked = db::revoke_refresh_token(pool, token, Utc::now()).await?;
    if !revoked {
        info!("logout with an unknown or already revoked token");
    }
    Ok(revoked)
}

async fn issue_token_pair(
    pool: &PgPool,
    settings: &TokenSettings,
    user: &User,
) -> Result<AuthResponse, AuthFlowError> {
    let now = Utc::now();
    let access = tokens::issue_access_token(settings, user, now)?;
    let refresh_token = tokens::generate_refresh_token();
    let refresh_expires_at = now + settings.refresh_ttl();
    db::insert_refresh_token(pool, user.id, &refresh_token, refresh_expires_at, now).await?;

    Ok(AuthResponse {
        access_token: access.token,
        refresh_token,
        expires_at: access.expires_at,
        user: AuthUserInfo::from(user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: "dev@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            full_name: "Dev Example".to_string(),
            phone_number: None,
            role: "Applicant".to_string(),
            verify_key: "0123456789".to_string(),
        }
    }

    fn message(result: Result<Role, AuthFlowError>) -> String {
        match result {
            Err(AuthFlowError::Validation(message)) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(matches!(validate_registration(&request()), Ok(Role::Applicant)));
    }

    #[test]
    fn employer_registration_passes() {
        let mut req = request();
        req.role = "Employer".to_string();
        assert!(matches!(validate_registration(&req), Ok(Role::Employer)));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["", "no-at-sign", "a@b", "two@@x.com", "spaced one@x.com"] {
            let mut req = request();
            req.email = email.to_string();
            assert!(message(validate_registration(&req)).contains("email"), "{email}");
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let mut req = request();
        req.password = "abc".to_string();
        req.confirm_password = "abc".to_string();
        assert!(message(validate_registration(&req)).contains("at least 6"));
    }

    #[test]
    fn oversized_password_is_rejected() {
        let mut req = request();
        req.password = "x".repeat(80);
        req.confirm_password = req.password.clone();
        assert!(message(validate_registration(&req)).contains("at most 72"));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let mut req = request();
        req.confirm_password = "different".to_string();
        assert!(message(validate_registration(&req)).contains("confirmation"));
    }

    #[test]
    fn blank_full_name_is_rejected() {
        let mut req = request();
        req.full_name = "   ".to_string();
        assert!(message(validate_registration(&req)).contains("full name"));
    }

    #[test]
    fn admin_role_cannot_register() {
        let mut req = request();
        req.role = "Admin".to_string();
        assert!(message(validate_registration(&req)).contains("Applicant or Employer"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut req = request();
        req.role = "Wizard".to_string();
        assert!(message(validate_registration(&req)).contains("Applicant or Employer"));
    }

    #[test]
    fn verify_key_shape_is_enforced() {
        for key in ["123", "abcdefghij", "x123456789"] {
            let mut req = request();
            req.verify_key = key.to_string();
            assert!(message(validate_registration(&req)).contains("verify key"), "{key}");
        }
    }
}
