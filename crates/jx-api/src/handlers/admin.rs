//! Admin console: dashboard, user management, job moderation, categories.
//!
//! Every route here sits behind the `/api/admin` prefix, which the access
//! table restricts to admins before a handler runs.

use axum::{
    Json, debug_handler,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde_json::json;

use jx_core::api::categories::CategoryPayload;
use jx_core::api::jobs::JobSummary;
use jx_core::api::stats::DashboardStats;
use jx_core::api::users::{RolePayload, StatusPayload, UserFilter, UserSummary};
use jx_core::db::{
    delete_category, delete_user, expire_due_jobs, fetch_dashboard_stats, hard_delete_job,
    insert_category, list_admin_jobs, list_all_categories, list_all_jobs, list_users,
    set_category_active, set_user_active, set_user_role, update_category, update_job_status,
};
use jx_core::domain::{Category, Job, JobStatus, Role};
use jx_core::pagination::{Page, PageParams};

use crate::SharedState;
use crate::error::ApiError;
use crate::handlers::validate::{optional_within, required_within};

const DEFAULT_PAGE_SIZE: i64 = 20;

pub async fn dashboard(State(state): State<SharedState>) -> Result<Json<DashboardStats>, ApiError> {
    let stats = fetch_dashboard_stats(&state.pool).await?;
    Ok(Json(stats))
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ListUsersParams {
    #[serde(flatten)]
    pub filter: UserFilter,
    #[serde(flatten)]
    pub page: PageParams,
}

fn validate_user_filter(filter: &UserFilter) -> Result<(), ApiError> {
    if let Some(role) = &filter.role {
        if Role::parse(role).is_none() {
            return Err(ApiError::BadRequest(format!(
                "unsupported role filter: {role}"
            )));
        }
    }

    Ok(())
}

#[debug_handler]
pub async fn users(
    State(state): State<SharedState>,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<Page<UserSummary>>, ApiError> {
    validate_user_filter(&params.filter)?;

    let request = params.page.normalize(DEFAULT_PAGE_SIZE);
    let page = list_users(&state.pool, &params.filter, &request).await?;
    Ok(Json(page))
}

pub async fn set_user_status(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = set_user_active(&state.pool, id, payload.is_active, Utc::now()).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("user {id} not found")));
    }

    Ok(Json(json!({ "updated": true })))
}

pub async fn change_user_role(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<RolePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let role = Role::parse(payload.role.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported role: {}", payload.role)))?;

    let updated = set_user_role(&state.pool, id, role, Utc::now()).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("user {id} not found")));
    }

    Ok(Json(json!({ "updated": true })))
}

/// Hard-deletes an account. Admin accounts are refused by storage.
pub async fn remove_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = delete_user(&state.pool, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("user {id} not found")));
    }

    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ModerationParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

fn parse_status_filter(params: &ModerationParams) -> Result<Option<JobStatus>, ApiError> {
    match &params.status {
        Some(value) => match JobStatus::parse(value) {
            Some(status) => Ok(Some(status)),
            None => Err(ApiError::BadRequest(format!(
                "unsupported status filter: {value}"
            ))),
        },
        None => Ok(None),
    }
}

/// Moderation queue: live postings, optionally narrowed to one status.
pub async fn jobs(
    State(state): State<SharedState>,
    Query(params): Query<ModerationParams>,
) -> Result<Json<Page<JobSummary>>, ApiError> {
    let status = parse_status_filter(&params)?;

    let request = params.page.normalize(DEFAULT_PAGE_SIZE);
    let page = list_admin_jobs(&state.pool, status, &request).await?;
    Ok(Json(page))
}

/// Every posting including soft-deleted ones.
pub async fn all_jobs(
    State(state): State<SharedState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<JobSummary>>, ApiError> {
    let request = params.normalize(DEFAULT_PAGE_SIZE);
    let page = list_all_jobs(&state.pool, &request).await?;
    Ok(Json(page))
}

/// Sweeps approved postings whose deadline has passed.
pub async fn expire_jobs(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let expired = expire_due_jobs(&state.pool, Utc::now()).await?;
    Ok(Json(json!({ "expired": expired })))
}

#[derive(Debug, serde::Deserialize)]
pub struct JobStatusPayload {
    pub status: String,
}

pub async fn moderate_job(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<JobStatusPayload>,
) -> Result<Json<Job>, ApiError> {
    let status = JobStatus::parse(payload.status.trim())
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported status: {}", payload.status)))?;

    let job = update_job_status(&state.pool, id, status, Utc::now()).await?;
    Ok(Json(job))
}

pub async fn remove_job(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = hard_delete_job(&state.pool, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("job {id} not found")));
    }

    Ok(Json(json!({ "deleted": true })))
}

pub async fn categories(State(state): State<SharedState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = list_all_categories(&state.pool).await?;
    Ok(Json(categories))
}

fn validate_category(payload: &CategoryPayload) -> Result<(), ApiError> {
    required_within(&payload.name, 100, "name")?;
    optional_within(payload.description.as_ref(), 500, "description")?;
    Ok(())
}

pub async fn add_category(
    State(state): State<SharedState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<Category>, ApiError> {
    validate_category(&payload)?;

    let category = insert_category(&state.pool, &payload).await?;
    Ok(Json(category))
}

pub async fn edit_category(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_category(&payload)?;

    let updated = update_category(&state.pool, id, &payload).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("category {id} not found")));
    }

    Ok(Json(json!({ "updated": true })))
}

pub async fn set_category_status(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = set_category_active(&state.pool, id, payload.is_active).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("category {id} not found")));
    }

    Ok(Json(json!({ "updated": true })))
}

/// Deleting is refused while active postings still reference the category.
pub async fn remove_category(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    delete_category(&state.pool, id).await?;
    Ok(Json(json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_user_filter_rejects_unknown_role() {
        let filter = UserFilter {
            role: Some("SuperAdmin".into()),
            ..Default::default()
        };

        let err = validate_user_filter(&filter).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validate_user_filter_allows_known_roles() {
        for role in ["Admin", "Employer", "Applicant"] {
            let filter = UserFilter {
                role: Some(role.into()),
                ..Default::default()
            };
            assert!(validate_user_filter(&filter).is_ok());
        }
    }

    #[test]
    fn parse_status_filter_rejects_unknown_status() {
        let params = ModerationParams {
            status: Some("Weird".into()),
            ..Default::default()
        };

        let err = parse_status_filter(&params).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn parse_status_filter_accepts_each_status() {
        for status in JobStatus::ALL {
            let params = ModerationParams {
                status: Some(status.as_str().into()),
                ..Default::default()
            };
            assert_eq!(parse_status_filter(&params).unwrap(), Some(*status));
        }
    }

    #[test]
    fn validate_category_rejects_blank_name() {
        let payload = CategoryPayload {
            name: "  ".into(),
            description: None,
        };

        let err = validate_category(&payload).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
