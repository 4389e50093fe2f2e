use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{borrow::Cow, future::Future};
use thiserror::Error;
use tracing::error;

use jx_core::auth::AuthFlowError;
use jx_core::db::{
    ApplicationStorageError, CategoryStorageError, CompanyStorageError, JobStorageError,
    JobViewStorageError, StatsError, TokenStorageError, UserStorageError,
};

tokio::task_local! {
    static REQUEST_ID: String;
}

fn sanitize_message(message: &str) -> String {
    const MAX_LEN: usize = 240;

    let mut cleaned = message
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>();

    cleaned = cleaned
        .split_whitespace()
        .map(|token| {
            if token.contains("://") {
                "[redacted-url]".to_string()
            } else if let Some((base, _)) = token.split_once('?') {
                if base.is_empty() {
                    "[redacted-query]".to_string()
                } else {
                    format!("{base}?[redacted]")
                }
            } else if token.starts_with('/') || token.contains('\\') {
                "[redacted-path]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
        cleaned.push('…');
    }

    if cleaned.trim().is_empty() {
        "unexpected error".to_string()
    } else {
        cleaned
    }
}

pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    if let Some(request_id) = request_id {
        REQUEST_ID.scope(request_id, fut).await
    } else {
        fut.await
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let request_id = current_request_id();

        error!(
            code,
            status = %status,
            request_id = request_id.as_deref().unwrap_or(""),
            error = %self,
            "api_error"
        );

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
            request_id,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::TooManyRequests(_) => "too_many_requests",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Unauthorized(_) => Cow::Borrowed("unauthorized"),
            ApiError::Forbidden(_) => Cow::Borrowed("forbidden"),
            ApiError::NotFound(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Conflict(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::TooManyRequests(_) => Cow::Borrowed("too many requests"),
            ApiError::ServiceUnavailable(_) => Cow::Borrowed("service unavailable"),
            ApiError::Database(_) | ApiError::Internal(_) => Cow::Borrowed("internal server error"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JobStorageError> for ApiError {
    fn from(value: JobStorageError) -> Self {
        match value {
            JobStorageError::NotFound(msg) => ApiError::NotFound(msg),
            JobStorageError::Conflict(msg) => ApiError::Conflict(msg),
            JobStorageError::Validation(msg) => ApiError::BadRequest(msg),
            JobStorageError::Forbidden(msg) => ApiError::Forbidden(msg),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<ApplicationStorageError> for ApiError {
    fn from(value: ApplicationStorageError) -> Self {
        match value {
            ApplicationStorageError::NotFound(msg) => ApiError::NotFound(msg),
            ApplicationStorageError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<UserStorageError> for ApiError {
    fn from(value: UserStorageError) -> Self {
        match value {
            UserStorageError::NotFound(msg) => ApiError::NotFound(msg),
            UserStorageError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<CategoryStorageError> for ApiError {
    fn from(value: CategoryStorageError) -> Self {
        match value {
            CategoryStorageError::NotFound(msg) => ApiError::NotFound(msg),
            CategoryStorageError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<CompanyStorageError> for ApiError {
    fn from(value: CompanyStorageError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<JobViewStorageError> for ApiError {
    fn from(value: JobViewStorageError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<TokenStorageError> for ApiError {
    fn from(value: TokenStorageError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<StatsError> for ApiError {
    fn from(value: StatsError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<AuthFlowError> for ApiError {
    fn from(value: AuthFlowError) -> Self {
        match value {
            AuthFlowError::InvalidCredentials => {
                ApiError::Unauthorized("invalid email or password".into())
            }
            AuthFlowError::AccountDisabled => {
                ApiError::Forbidden("this account has been deactivated".into())
            }
            AuthFlowError::EmailTaken(email) => {
                ApiError::Conflict(format!("email {email} is already registered"))
            }
            AuthFlowError::Validation(msg) => ApiError::BadRequest(msg),
            AuthFlowError::InvalidRefreshToken => {
                ApiError::Unauthorized("invalid or expired refresh token".into())
            }
            AuthFlowError::Storage(err) => err.into(),
            AuthFlowError::Tokens(err) => err.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn includes_request_id_in_response_body_when_present() {
        let err = ApiError::Internal("boom".into());
        let response = with_request_id(Some("req-123".into()), async { err.into_response() }).await;

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = body.collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["request_id"], "req-123");
    }

    #[test]
    fn conflict_messages_are_sanitized_for_clients() {
        let sanitized = sanitize_message("lookup failed for https://db.internal/users?id=1");
        assert!(sanitized.contains("[redacted-url]"));
        assert!(!sanitized.contains("db.internal"));
    }

    #[test]
    fn login_failure_maps_to_unauthorized() {
        let err: ApiError = AuthFlowError::InvalidCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
