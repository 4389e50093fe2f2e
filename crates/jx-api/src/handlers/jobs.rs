//! Public job catalogue: browse, search, and view postings.

use std::net::SocketAddr;

use axum::http::{HeaderMap, header};
use axum::{
    Json, debug_handler,
    extract::{ConnectInfo, Path, Query, State},
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use jx_core::api::jobs::{JobFilter, JobSummary};
use jx_core::db::{JobViewer, fetch_job_detail, has_applied, list_public_jobs, record_job_view};
use jx_core::domain::Role;
use jx_core::pagination::{Page, PageParams};

use crate::SharedState;
use crate::auth::OptionalAuthUser;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Default, serde::Deserialize)]
pub struct CatalogueParams {
    #[serde(flatten)]
    pub filter: JobFilter,
    #[serde(flatten)]
    pub page: PageParams,
}

#[debug_handler]
pub async fn list_jobs(
    State(state): State<SharedState>,
    Query(params): Query<CatalogueParams>,
) -> Result<Json<Page<JobSummary>>, ApiError> {
    let request = params.page.normalize(DEFAULT_PAGE_SIZE);

    match list_public_jobs(&state.pool, &params.filter, &request).await {
        Ok(page) => Ok(Json(page)),
        Err(err) => {
            warn!(error = %err, "job catalogue query failed, serving an empty page");
            Ok(Json(Page::empty(&request)))
        }
    }
}

/// Detail view. Records a deduplicated view and, for applicants, whether
/// they already applied. Inactive postings stay visible to admins only.
pub async fn job_detail(
    State(state): State<SharedState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Path(id): Path<i64>,
    headers: HeaderMap,
    connect: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let now = Utc::now();
    let detail = fetch_job_detail(&state.pool, id, now)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {id} not found")))?;

    let is_admin = auth.as_ref().is_some_and(|user| user.role == Role::Admin);
    if !detail.is_active && !is_admin {
        return Err(ApiError::NotFound(format!("job {id} not found")));
    }

    let viewer = JobViewer::new(
        auth.as_ref().map(|user| user.user_id),
        client_ip(&headers, connect.as_ref()),
        user_agent(&headers),
    );
    if let Err(err) = record_job_view(&state.pool, id, &viewer, now).await {
        warn!(job_id = id, error = %err, "failed to record job view");
    }

    let mut applied = false;
    if let Some(user) = auth.as_ref().filter(|user| user.role == Role::Applicant) {
        applied = match has_applied(&state.pool, user.user_id, id).await {
            Ok(found) => found,
            Err(err) => {
                warn!(job_id = id, error = %err, "has-applied lookup failed");
                false
            }
        };
    }

    Ok(Json(json!({ "job": detail, "has_applied": applied })))
}

/// First hop of `x-forwarded-for` when present, otherwise the socket peer.
fn client_ip(headers: &HeaderMap, connect: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    connect.map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.parse().unwrap());
        headers
    }

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let headers = forwarded("203.0.113.7, 10.0.0.1");
        let connect = ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000)));

        assert_eq!(
            client_ip(&headers, Some(&connect)),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn client_ip_falls_back_to_socket_peer() {
        let headers = HeaderMap::new();
        let connect = ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 55555)));

        assert_eq!(
            client_ip(&headers, Some(&connect)),
            Some("192.168.1.20".to_string())
        );
    }

    #[test]
    fn client_ip_ignores_blank_forwarded_header() {
        let headers = forwarded("   ");

        assert_eq!(client_ip(&headers, None), None);
    }

    #[test]
    fn user_agent_reads_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, "jx-test/1.0".parse().unwrap());

        assert_eq!(user_agent(&headers), Some("jx-test/1.0".to_string()));
    }
}
