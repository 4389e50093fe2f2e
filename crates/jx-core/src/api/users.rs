//! Wire types for profile and admin user management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::companies::CompanyCard;
use crate::domain::{Role, User};

/// Profile as returned to its owner. `verify_key` is the decrypted value;
/// it is absent when none was stored or the blob no longer opens.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub avatar_url: Option<String>,
    pub cv_url: Option<String>,
    pub skills: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub verify_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub company: Option<CompanyCard>,
}

impl ProfileResponse {
    pub fn from_parts(user: User, verify_key: Option<String>, company: Option<CompanyCard>) -> Self {
        ProfileResponse {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            avatar_url: user.avatar_url,
            cv_url: user.cv_url,
            skills: user.skills,
            bio: user.bio,
            role: user.role,
            is_active: user.is_active,
            verify_key,
            created_at: user.created_at,
            company,
        }
    }
}

/// Profile fields a user maintains themselves. Avatar and CV URLs are only
/// overwritten when sent, so a client that omits them never clears an
/// earlier upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub cv_url: Option<String>,
    #[serde(default)]
    pub company: Option<crate::api::companies::CompanyUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChangePayload {
    pub current_password: String,
    pub new_password: String,
}

/// Admin user-list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Row on the admin user list.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePayload {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub is_active: bool,
}
