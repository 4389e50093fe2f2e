//! Public company pages: the card and the company's open postings.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use jx_core::api::companies::CompanyCard;
use jx_core::api::jobs::JobSummary;
use jx_core::db::{fetch_company, list_company_jobs};
use jx_core::pagination::{Page, PageParams};

use crate::SharedState;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 10;

pub async fn company_detail(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<CompanyCard>, ApiError> {
    let company = fetch_company(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company {id} not found")))?;

    Ok(Json(CompanyCard::from(company)))
}

/// Open postings for one company, newest first.
pub async fn company_jobs(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<JobSummary>>, ApiError> {
    let company = fetch_company(&state.pool, id).await?;
    if company.is_none() {
        return Err(ApiError::NotFound(format!("company {id} not found")));
    }

    let request = params.normalize(DEFAULT_PAGE_SIZE);
    let page = list_company_jobs(&state.pool, id, &request).await?;
    Ok(Json(page))
}
