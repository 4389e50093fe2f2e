//! Employer console: manage postings and review incoming applications.

use axum::{
    Json, debug_handler,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde_json::json;

use jx_core::api::applications::{ApplicationDetail, ReviewPayload};
use jx_core::api::jobs::{EmployerJobRow, JobPayload};
use jx_core::db::{
    create_job, employer_owns_application, employer_owns_job, list_applications_by_employer,
    list_applications_for_job, list_employer_jobs, soft_delete_job, update_application_status,
    update_job,
};
use jx_core::domain::{ApplicationStatus, Job, Role};
use jx_core::pagination::{Page, PageParams};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::validate::{optional_within, required_within};

const DEFAULT_PAGE_SIZE: i64 = 10;

fn validate_job_payload(payload: &JobPayload, now: DateTime<Utc>) -> Result<(), ApiError> {
    required_within(&payload.title, 200, "title")?;
    if payload.description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "description must not be empty".into(),
        ));
    }
    if payload.application_deadline <= now {
        return Err(ApiError::BadRequest(
            "application deadline must be in the future".into(),
        ));
    }
    if let Some(positions) = payload.positions {
        if positions < 1 {
            return Err(ApiError::BadRequest("positions must be at least 1".into()));
        }
    }

    optional_within(payload.requirements.as_ref(), 1_000, "requirements")?;
    optional_within(payload.benefits.as_ref(), 1_000, "benefits")?;
    optional_within(payload.salary_range.as_ref(), 100, "salary_range")?;
    optional_within(payload.location.as_ref(), 100, "location")?;
    optional_within(payload.job_type.as_ref(), 50, "job_type")?;

    Ok(())
}

pub async fn my_jobs(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<EmployerJobRow>>, ApiError> {
    let request = params.normalize(DEFAULT_PAGE_SIZE);
    let page = list_employer_jobs(&state.pool, auth.user_id, &request).await?;
    Ok(Json(page))
}

/// New postings always start in `Pending` and wait for moderation.
#[debug_handler]
pub async fn post_job(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<JobPayload>,
) -> Result<Json<Job>, ApiError> {
    auth.require_role(&[Role::Employer])?;
    validate_job_payload(&payload, Utc::now())?;

    let job = create_job(&state.pool, auth.user_id, &payload, Utc::now()).await?;
    Ok(Json(job))
}

pub async fn edit_job(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<JobPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_role(&[Role::Employer])?;
    validate_job_payload(&payload, Utc::now())?;

    update_job(&state.pool, id, auth.user_id, &payload, Utc::now()).await?;
    Ok(Json(json!({ "updated": true })))
}

/// Soft delete: the posting disappears from listings and its pending
/// applications are rejected with an explanatory note.
pub async fn remove_job(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_role(&[Role::Employer])?;

    let removed = soft_delete_job(&state.pool, id, auth.user_id, Utc::now()).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("job {id} not found")));
    }

    Ok(Json(json!({ "deleted": true })))
}

pub async fn job_applications(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ApplicationDetail>>, ApiError> {
    if auth.role != Role::Admin && !employer_owns_job(&state.pool, id, auth.user_id).await? {
        return Err(ApiError::Forbidden(format!(
            "job {id} belongs to another employer"
        )));
    }

    let request = params.normalize(DEFAULT_PAGE_SIZE);
    let page = list_applications_for_job(&state.pool, id, &request).await?;
    Ok(Json(page))
}

/// Every application across all of the employer's postings.
pub async fn all_applications(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ApplicationDetail>>, ApiError> {
    let request = params.normalize(DEFAULT_PAGE_SIZE);
    let page = list_applications_by_employer(&state.pool, auth.user_id, &request).await?;
    Ok(Json(page))
}

pub async fn review_application(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = ApplicationStatus::parse(payload.status.trim()).ok_or_else(|| {
        ApiError::BadRequest(format!("unsupported review status: {}", payload.status))
    })?;

    if auth.role != Role::Admin && !employer_owns_application(&state.pool, id, auth.user_id).await?
    {
        return Err(ApiError::Forbidden(format!(
            "application {id} belongs to another employer"
        )));
    }

    update_application_status(&state.pool, id, status, payload.note.as_deref(), Utc::now()).await?;
    Ok(Json(json!({ "updated": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payload() -> JobPayload {
        JobPayload {
            title: "Backend Engineer".into(),
            description: "Own the billing services.".into(),
            requirements: None,
            benefits: None,
            salary_range: Some("90-120k".into()),
            location: Some("Berlin".into()),
            job_type: Some("FullTime".into()),
            positions: Some(2),
            application_deadline: Utc::now() + Duration::days(30),
            category_id: 1,
        }
    }

    #[test]
    fn validate_job_payload_accepts_complete_posting() {
        assert!(validate_job_payload(&payload(), Utc::now()).is_ok());
    }

    #[test]
    fn validate_job_payload_rejects_blank_title() {
        let mut posting = payload();
        posting.title = "  ".into();

        let err = validate_job_payload(&posting, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validate_job_payload_rejects_past_deadline() {
        let mut posting = payload();
        posting.application_deadline = Utc::now() - Duration::days(1);

        let err = validate_job_payload(&posting, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("deadline")));
    }

    #[test]
    fn validate_job_payload_rejects_zero_positions() {
        let mut posting = payload();
        posting.positions = Some(0);

        let err = validate_job_payload(&posting, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("positions")));
    }

    #[test]
    fn validate_job_payload_enforces_column_widths() {
        let mut posting = payload();
        posting.job_type = Some("x".repeat(51));

        let err = validate_job_payload(&posting, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(message) if message.contains("job_type")));
    }
}
