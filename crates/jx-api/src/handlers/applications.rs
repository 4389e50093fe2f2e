//! Applicant-side application endpoints: apply, list own, inspect, cancel.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde_json::json;

use jx_core::api::applications::{ApplicationDetail, ApplicationSummary, NewApplication};
use jx_core::db::{
    cancel_application, create_application, employer_owns_application, fetch_application,
    list_applications_by_applicant,
};
use jx_core::domain::{Application, Role};
use jx_core::pagination::{Page, PageParams};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::validate::optional_within;

const DEFAULT_PAGE_SIZE: i64 = 10;
// Matches the VARCHAR(1000) column.
const MAX_COVER_LETTER_CHARS: usize = 1_000;

fn validate_application(payload: &NewApplication) -> Result<(), ApiError> {
    if payload.cover_letter.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "cover letter must not be empty".into(),
        ));
    }
    if payload.cover_letter.chars().count() > MAX_COVER_LETTER_CHARS {
        return Err(ApiError::BadRequest(format!(
            "cover letter must be at most {MAX_COVER_LETTER_CHARS} characters"
        )));
    }

    optional_within(payload.cv_url.as_ref(), 255, "cv_url")
}

pub async fn apply(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<NewApplication>,
) -> Result<Json<Application>, ApiError> {
    auth.require_role(&[Role::Applicant])?;
    validate_application(&payload)?;

    let application = create_application(&state.pool, auth.user_id, &payload, Utc::now()).await?;
    Ok(Json(application))
}

pub async fn my_applications(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ApplicationSummary>>, ApiError> {
    let request = params.normalize(DEFAULT_PAGE_SIZE);
    let page = list_applications_by_applicant(&state.pool, auth.user_id, &request).await?;
    Ok(Json(page))
}

/// Applicants see their own application, admins see all of them, and an
/// employer sees applications against their postings.
pub async fn application_detail(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationDetail>, ApiError> {
    let detail = fetch_application(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;

    let allowed = match auth.role {
        Role::Admin => true,
        Role::Applicant => detail.applicant_id == auth.user_id,
        Role::Employer => employer_owns_application(&state.pool, id, auth.user_id).await?,
    };
    if !allowed {
        return Err(ApiError::Forbidden(format!(
            "application {id} belongs to another account"
        )));
    }

    Ok(Json(detail))
}

/// Cancelling is only possible while the application is still pending.
pub async fn cancel(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_role(&[Role::Applicant])?;

    let cancelled = cancel_application(&state.pool, id, auth.user_id, Utc::now()).await?;
    if !cancelled {
        return Err(ApiError::Conflict(format!(
            "application {id} is not pending or does not belong to you"
        )));
    }

    Ok(Json(json!({ "cancelled": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(cover_letter: &str) -> NewApplication {
        NewApplication {
            job_id: 7,
            cover_letter: cover_letter.to_string(),
            cv_url: None,
        }
    }

    #[test]
    fn validate_application_rejects_blank_cover_letter() {
        let err = validate_application(&payload("   ")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validate_application_rejects_oversized_cover_letter() {
        let letter = "x".repeat(MAX_COVER_LETTER_CHARS + 1);
        let err = validate_application(&payload(&letter)).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validate_application_accepts_reasonable_letter() {
        assert!(validate_application(&payload("I would love to join.")).is_ok());
    }

    #[test]
    fn validate_application_rejects_oversized_cv_url() {
        let mut request = payload("A fine letter.");
        request.cv_url = Some(format!("https://cv.example/{}", "x".repeat(240)));

        let err = validate_application(&request).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("cv_url")));
    }
}
