use chrono::{DateTime, Utc};

/// A stored refresh token. The opaque token string is the credential; rows
/// are kept after revocation so reuse attempts can be told apart from
/// made-up tokens in the logs.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.expires_at > now
    }
}
