use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use jx_core::auth::{TokenSettings, tokens};
use jx_core::domain::Role;

use crate::AppConfig;
use crate::error::ApiError;

/// Authenticated caller, decoded from the bearer token. No database round
/// trip happens here; a role change takes effect when the token rotates.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "role {} may not call this endpoint",
                self.role
            )))
        }
    }
}

pub fn authorize_bearer(
    headers: &HeaderMap,
    settings: &TokenSettings,
) -> Result<AuthUser, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

    let claims = tokens::decode_access_token(settings, token)
        .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| ApiError::Unauthorized("invalid token subject".into()))?;
    let role = Role::parse(&claims.role)
        .ok_or_else(|| ApiError::Unauthorized("unknown role in token".into()))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        name: claims.name,
        role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = AppConfig::from_ref(state).tokens;
        authorize_bearer(&parts.headers, &settings)
    }
}

/// Caller identity on routes that serve both visitors and signed-in users.
/// A missing or invalid token degrades to anonymous instead of rejecting.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    AppConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = AppConfig::from_ref(state).tokens;
        Ok(OptionalAuthUser(
            authorize_bearer(&parts.headers, &settings).ok(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use jx_core::auth::tokens::issue_access_token;
    use jx_core::domain::User;

    fn settings() -> TokenSettings {
        TokenSettings {
            secret: "test-secret".to_string(),
            issuer: "jx-api".to_string(),
            audience: "jx-clients".to_string(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 30,
        }
    }

    fn sample_user(role: Role) -> User {
        User {
            id: 42,
            email: "person@example.com".to_string(),
            password_hash: "x".to_string(),
            full_name: "Person Example".to_string(),
            phone_number: None,
            avatar_url: None,
            cv_url: None,
            skills: None,
            bio: None,
            role,
            is_active: true,
            verify_key: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn valid_bearer_token_is_accepted() {
        let settings = settings();
        let issued = issue_access_token(&settings, &sample_user(Role::Employer), Utc::now()).unwrap();

        let user = authorize_bearer(&bearer_headers(&issued.token), &settings).unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.role, Role::Employer);
        assert_eq!(user.email, "person@example.com");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = authorize_bearer(&HeaderMap::new(), &settings()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn non_bearer_scheme_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        let err = authorize_bearer(&headers, &settings()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn mangled_token_is_unauthorized() {
        let err = authorize_bearer(&bearer_headers("not-a-jwt"), &settings()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn require_role_checks_membership() {
        let settings = settings();
        let issued = issue_access_token(&settings, &sample_user(Role::Applicant), Utc::now()).unwrap();
        let user = authorize_bearer(&bearer_headers(&issued.token), &settings).unwrap();

        assert!(user.require_role(&[Role::Applicant, Role::Admin]).is_ok());
        let err = user.require_role(&[Role::Admin]).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
