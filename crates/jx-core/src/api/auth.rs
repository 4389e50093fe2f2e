//! Wire types for the auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub role: String,
    pub verify_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Without remember-me a login revokes every other refresh token for
    /// the account, enforcing a single session.
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserInfo {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl From<&User> for AuthUserInfo {
    fn from(user: &User) -> Self {
        AuthUserInfo {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}

/// Token pair handed out by register, login, and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUserInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_me_defaults_to_false() {
        let request: LoginRequest = serde_json::from_value(serde_json::json!({
            "email": "dev@example.com",
            "password": "hunter2!"
        }))
        .unwrap();
        assert!(!request.remember_me);
    }
}
