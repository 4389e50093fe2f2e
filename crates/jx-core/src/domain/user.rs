use chrono::{DateTime, Utc};

use crate::domain::Role;

/// An account row. Deliberately not serializable: it carries the password
/// hash and the encrypted verify key, so the wire types in [`crate::api`]
/// pick fields explicitly instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
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
    pub updated_at: Option<DateTime<Utc>>,
}
