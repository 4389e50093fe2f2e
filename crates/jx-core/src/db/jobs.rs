//! Posting storage: lifecycle moves, employer edits, and the listing
//! queries behind the public catalogue, the employer desk, and moderation.

use chrono::{DateTime, Utc};
use deadpool_postgres::{GenericClient, PoolError};
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::instrument;

use crate::api::companies::CompanyCard;
use crate::api::jobs::{EmployerJobRow, JobDetail, JobFilter, JobPayload, JobSummary};
use crate::db::PgPool;
use crate::db::util::TimedClientExt;
use crate::domain::{Job, JobStatus};
use crate::pagination::{Page, PageRequest};

#[derive(Debug, thiserror::Error)]
pub enum JobStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map job row: {0}")]
    Mapping(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
}

const JOB_COLUMNS: &str = "id, title, description, requirements, benefits, salary_range, location, job_type, positions, application_deadline, status, view_count, is_active, company_id, category_id, created_at, updated_at";

const SUMMARY_SELECT: &str = "SELECT j.id, j.title, j.salary_range, j.location, j.job_type, j.status, j.is_active, j.view_count, j.application_deadline, j.created_at, c.name AS company_name, c.logo_url AS company_logo_url, cat.name AS category_name";

const SUMMARY_FROM: &str = " FROM jx.jobs j JOIN jx.companies c ON c.id = j.company_id JOIN jx.categories cat ON cat.id = j.category_id";

fn parse_job_status(value: &str) -> Result<JobStatus, JobStorageError> {
    JobStatus::parse(value)
        .ok_or_else(|| JobStorageError::Mapping(format!("unknown job status: {value}")))
}

fn row_to_job(row: &Row) -> Result<Job, JobStorageError> {
    Ok(Job {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        requirements: row.try_get("requirements")?,
        benefits: row.try_get("benefits")?,
        salary_range: row.try_get("salary_range")?,
        location: row.try_get("location")?,
        job_type: row.try_get("job_type")?,
        positions: row.try_get("positions")?,
        application_deadline: row.try_get("application_deadline")?,
        status: parse_job_status(row.try_get::<_, String>("status")?.as_str())?,
        view_count: row.try_get("view_count")?,
        is_active: row.try_get("is_active")?,
        company_id: row.try_get("company_id")?,
        category_id: row.try_get("category_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_job_summary(row: &Row) -> Result<JobSummary, JobStorageError> {
    Ok(JobSummary {
        id: row.get("id"),
        title: row.get("title"),
        salary_range: row.get("salary_range"),
        location: row.get("location"),
        job_type: row.get("job_type"),
        status: parse_job_status(row.try_get::<_, String>("status")?.as_str())?,
        is_active: row.get("is_active"),
        view_count: row.get("view_count"),
        application_deadline: row.get("application_deadline"),
        company_name: row.get("company_name"),
        company_logo_url: row.get("company_logo_url"),
        category_name: row.get("category_name"),
        created_at: row.get("created_at"),
    })
}

fn row_to_job_detail(row: &Row) -> Result<JobDetail, JobStorageError> {
    Ok(JobDetail {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        requirements: row.try_get("requirements")?,
        benefits: row.try_get("benefits")?,
        salary_range: row.try_get("salary_range")?,
        location: row.try_get("location")?,
        job_type: row.try_get("job_type")?,
        positions: row.try_get("positions")?,
        application_deadline: row.try_get("application_deadline")?,
        status: parse_job_status(row.try_get::<_, String>("status")?.as_str())?,
        view_count: row.try_get("view_count")?,
        is_active: row.try_get("is_active")?,
        company: CompanyCard {
            id: row.try_get("company_id")?,
            name: row.try_get("company_name")?,
            description: row.try_get("company_description")?,
            logo_url: row.try_get("company_logo_url")?,
            website: row.try_get("company_website")?,
            address: row.try_get("company_address")?,
            city: row.try_get("company_city")?,
        },
        category_id: row.try_get("category_id")?,
        category_name: row.try_get("category_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).unwrap_or("").is_empty()
}

/// What still has to be filled in before the company may post. `None` means
/// the profile is complete enough.
fn company_profile_gap(
    name: &str,
    description: Option<&str>,
    address: Option<&str>,
    city: Option<&str>,
) -> Option<&'static str> {
    if name.trim().is_empty() {
        return Some("company name is missing; complete the company profile before posting jobs");
    }
    if is_blank(description) {
        return Some(
            "company description is missing; complete the company profile before posting jobs",
        );
    }
    if is_blank(address) || is_blank(city) {
        return Some(
            "company address and city are missing; complete the company profile before posting jobs",
        );
    }
    None
}

/// Create a posting for the employer's company. Every posting starts out
/// `Pending` and invisible to the public catalogue until moderation
/// approves it.
#[instrument(skip(pool, payload))]
pub async fn create_job(
    pool: &PgPool,
    employer_id: i64,
    payload: &JobPayload,
    now: DateTime<Utc>,
) -> Result<Job, JobStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let company = tx
        .query_opt(
            "SELECT id, name, description, address, city FROM jx.companies WHERE employer_id = $1",
            &[&employer_id],
        )
        .await?;
    let Some(company) = company else {
        return Err(JobStorageError::Validation(
            "employer has no company profile; save one before posting jobs".to_string(),
        ));
    };

    let name: String = company.try_get("name")?;
    let description: Option<String> = company.try_get("description")?;
    let address: Option<String> = company.try_get("address")?;
    let city: Option<String> = company.try_get("city")?;
    if let Some(gap) =
        company_profile_gap(&name, description.as_deref(), address.as_deref(), city.as_deref())
    {
        return Err(JobStorageError::Validation(gap.to_string()));
    }
    let company_id: i64 = company.try_get("id")?;

    let category = tx
        .query_opt(
            "SELECT is_active FROM jx.categories WHERE id = $1",
            &[&payload.category_id],
        )
        .await?;
    let Some(category) = category else {
        return Err(JobStorageError::Validation(format!(
            "category {} does not exist",
            payload.category_id
        )));
    };
    if !category.try_get::<_, bool>("is_active")? {
        return Err(JobStorageError::Validation(format!(
            "category {} is inactive",
            payload.category_id
        )));
    }

    let insert = format!(
        "INSERT INTO jx.jobs (title, description, requirements, benefits, salary_range, location, job_type, positions, application_deadline, status, company_id, category_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Pending', $10, $11, $12)
         RETURNING {JOB_COLUMNS}"
    );
    let row = tx
        .query_one(
            &insert,
            &[
                &payload.title,
                &payload.description,
                &payload.requirements,
                &payload.benefits,
                &payload.salary_range,
                &payload.location,
                &payload.job_type,
                &payload.positions,
                &payload.application_deadline,
                &company_id,
                &payload.category_id,
                &now,
            ],
        )
        .await?;
    let job = row_to_job(&row)?;

    tx.commit().await?;
    Ok(job)
}

/// Fetch one posting with its company and category. An approved posting
/// past its deadline is flipped to `Expired` first, so callers always see
/// the settled status.
#[instrument(skip(pool))]
pub async fn fetch_job_detail(
    pool: &PgPool,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Option<JobDetail>, JobStorageError> {
    let client = pool.get().await?;

    let expire = client
        .prepare_cached(
            "UPDATE jx.jobs SET status = 'Expired', updated_at = $2
             WHERE id = $1 AND status = 'Approved' AND application_deadline < $2",
        )
        .await?;
    client.execute(&expire, &[&id, &now]).await?;

    let stmt = client
        .prepare_cached(
            "SELECT j.id, j.title, j.description, j.requirements, j.benefits, j.salary_range, j.location, j.job_type, j.positions, j.application_deadline, j.status, j.view_count, j.is_active, j.category_id, j.created_at, j.updated_at,
                    c.id AS company_id, c.name AS company_name, c.description AS company_description, c.logo_url AS company_logo_url, c.website AS company_website, c.address AS company_address, c.city AS company_city,
                    cat.name AS category_name
             FROM jx.jobs j
             JOIN jx.companies c ON c.id = j.company_id
             JOIN jx.categories cat ON cat.id = j.category_id
             WHERE j.id = $1",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&id]).await?;
    row.map(|r| row_to_job_detail(&r)).transpose()
}

/// Apply an employer edit. Editing an approved posting sends it back to
/// moderation; any other status is left as it is.
#[instrument(skip(pool, payload))]
pub async fn update_job(
    pool: &PgPool,
    job_id: i64,
    employer_id: i64,
    payload: &JobPayload,
    now: DateTime<Utc>,
) -> Result<(), JobStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let category = tx
        .query_opt(
            "SELECT 1 FROM jx.categories WHERE id = $1",
            &[&payload.category_id],
        )
        .await?;
    if category.is_none() {
        return Err(JobStorageError::Validation(format!(
            "category {} does not exist",
            payload.category_id
        )));
    }

    let updated = tx
        .execute(
            "UPDATE jx.jobs j SET
                title = $3, description = $4, requirements = $5, benefits = $6,
                salary_range = $7, location = $8, job_type = $9, positions = $10,
                application_deadline = $11, category_id = $12,
                status = CASE WHEN j.status = 'Approved' THEN 'Pending' ELSE j.status END,
                updated_at = $13
             FROM jx.companies c
             WHERE j.id = $1 AND c.id = j.company_id AND c.employer_id = $2",
            &[
                &job_id,
                &employer_id,
                &payload.title,
                &payload.description,
                &payload.requirements,
                &payload.benefits,
                &payload.salary_range,
                &payload.location,
                &payload.job_type,
                &payload.positions,
                &payload.application_deadline,
                &payload.category_id,
                &now,
            ],
        )
        .await?;

    if updated == 1 {
        tx.commit().await?;
        return Ok(());
    }

    // Nothing matched; figure out which refusal this is.
    let exists = tx
        .query_opt("SELECT 1 FROM jx.jobs WHERE id = $1", &[&job_id])
        .await?;
    match exists {
        None => Err(JobStorageError::NotFound(format!("job {job_id} not found"))),
        Some(_) => Err(JobStorageError::Forbidden(format!(
            "job {job_id} belongs to another employer"
        ))),
    }
}

/// Move a posting to `target` when the lifecycle allows it. This is the
/// moderation entry point: approve or reject pending postings, close or
/// expire approved ones.
#[instrument(skip(pool))]
pub async fn update_job_status(
    pool: &PgPool,
    job_id: i64,
    target: JobStatus,
    now: DateTime<Utc>,
) -> Result<Job, JobStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_opt("SELECT status FROM jx.jobs WHERE id = $1 FOR UPDATE", &[&job_id])
        .await?;
    let Some(row) = row else {
        return Err(JobStorageError::NotFound(format!("job {job_id} not found")));
    };

    let current = parse_job_status(row.try_get::<_, String>("status")?.as_str())?;
    if !current.can_transition_to(target) {
        return Err(JobStorageError::Conflict(format!(
            "job {job_id} is {current} and cannot move to {target}"
        )));
    }

    let update = format!(
        "UPDATE jx.jobs SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {JOB_COLUMNS}"
    );
    let row = tx
        .query_one(&update, &[&job_id, &target.as_str(), &now])
        .await?;
    let job = row_to_job(&row)?;

    tx.commit().await?;
    Ok(job)
}

/// Flip every live approved posting past its deadline to `Expired` in one
/// statement. Returns how many rows changed.
#[instrument(skip(pool))]
pub async fn expire_due_jobs(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, JobStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "UPDATE jx.jobs SET status = 'Expired', updated_at = $1
             WHERE is_active AND status = 'Approved' AND application_deadline < $1",
        )
        .await?;
    let rows = client.execute(&stmt, &[&now]).await?;
    Ok(rows)
}

/// Employer-facing delete: deactivate the posting, close it, and reject
/// whatever applications were still pending on it. Returns false when the
/// posting is missing, already inactive, or owned by someone else.
#[instrument(skip(pool))]
pub async fn soft_delete_job(
    pool: &PgPool,
    job_id: i64,
    employer_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, JobStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let updated = tx
        .execute(
            "UPDATE jx.jobs j SET is_active = false, status = 'Closed', updated_at = $3
             FROM jx.companies c
             WHERE j.id = $1 AND c.id = j.company_id AND c.employer_id = $2 AND j.is_active",
            &[&job_id, &employer_id, &now],
        )
        .await?;
    if updated == 0 {
        return Ok(false);
    }

    tx.execute(
        "UPDATE jx.applications SET status = 'Rejected', note = $2, reviewed_at = $3
         WHERE job_id = $1 AND status = 'Pending'",
        &[&job_id, &CLOSED_BY_EMPLOYER_NOTE, &now],
    )
    .await?;

    tx.commit().await?;
    Ok(true)
}

const CLOSED_BY_EMPLOYER_NOTE: &str = "The job posting was closed by the employer.";

/// Remove a posting and its dependent rows for good. Moderation only.
#[instrument(skip(pool))]
pub async fn hard_delete_job(pool: &PgPool, job_id: i64) -> Result<bool, JobStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute("DELETE FROM jx.jobs WHERE id = $1", &[&job_id])
        .await?;
    Ok(rows > 0)
}

#[instrument(skip(pool))]
pub async fn employer_owns_job(
    pool: &PgPool,
    job_id: i64,
    employer_id: i64,
) -> Result<bool, JobStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT EXISTS (
                SELECT 1 FROM jx.jobs j
                JOIN jx.companies c ON c.id = j.company_id
                WHERE j.id = $1 AND c.employer_id = $2
             )",
        )
        .await?;
    let row = client.query_one(&stmt, &[&job_id, &employer_id]).await?;
    Ok(row.get(0))
}

/// Count-then-fetch for one listing variant. `values` holds the filter
/// parameters already bound into `where_clause`.
async fn paged_summaries(
    client: &impl GenericClient,
    where_clause: String,
    mut values: Vec<Box<dyn ToSql + Sync + Send>>,
    page: &PageRequest,
    label: &str,
) -> Result<Page<JobSummary>, JobStorageError> {
    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect();
    let count_query = format!("SELECT COUNT(*){SUMMARY_FROM}{where_clause}");
    let total: i64 = client
        .timed_query_one(&count_query, &params, label)
        .await?
        .get(0);

    let query = format!(
        "{SUMMARY_SELECT}{SUMMARY_FROM}{where_clause} ORDER BY j.created_at DESC, j.id DESC LIMIT ${} OFFSET ${}",
        values.len() + 1,
        values.len() + 2
    );
    values.push(Box::new(page.limit()));
    values.push(Box::new(page.offset()));

    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect();
    let rows = client.timed_query(&query, &params, label).await?;

    let items = rows
        .iter()
        .map(row_to_job_summary)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total))
}

/// The public catalogue: live approved postings, newest first.
#[instrument(skip(pool))]
pub async fn list_public_jobs(
    pool: &PgPool,
    filter: &JobFilter,
    page: &PageRequest,
) -> Result<Page<JobSummary>, JobStorageError> {
    let client = pool.get().await?;

    let mut values: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
    let mut where_clause = String::from(" WHERE j.is_active AND j.status = 'Approved'");

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let position = values.len() + 1;
        where_clause.push_str(&format!(
            " AND (j.title ILIKE ${position} OR j.description ILIKE ${position} OR c.name ILIKE ${position})"
        ));
        values.push(Box::new(format!("%{search}%")));
    }

    if let Some(category_id) = filter.category_id {
        where_clause.push_str(&format!(" AND j.category_id = ${}", values.len() + 1));
        values.push(Box::new(category_id));
    }

    if let Some(location) = filter.location.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        where_clause.push_str(&format!(" AND j.location ILIKE ${}", values.len() + 1));
        values.push(Box::new(format!("%{location}%")));
    }

    paged_summaries(&client, where_clause, values, page, "list_public_jobs").await
}

/// Moderation queue: live postings, optionally narrowed to one status.
#[instrument(skip(pool))]
pub async fn list_admin_jobs(
    pool: &PgPool,
    status: Option<JobStatus>,
    page: &PageRequest,
) -> Result<Page<JobSummary>, JobStorageError> {
    let client = pool.get().await?;

    let mut values: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
    let mut where_clause = String::from(" WHERE j.is_active");

    if let Some(status) = status {
        where_clause.push_str(&format!(" AND j.status = ${}", values.len() + 1));
        values.push(Box::new(status.as_str()));
    }

    paged_summaries(&client, where_clause, values, page, "list_admin_jobs").await
}

/// Everything in the table, soft-deleted postings included.
#[instrument(skip(pool))]
pub async fn list_all_jobs(
    pool: &PgPool,
    page: &PageRequest,
) -> Result<Page<JobSummary>, JobStorageError> {
    let client = pool.get().await?;
    paged_summaries(&client, String::new(), Vec::new(), page, "list_all_jobs").await
}

/// Live approved postings of one company, for its public page.
#[instrument(skip(pool))]
pub async fn list_company_jobs(
    pool: &PgPool,
    company_id: i64,
    page: &PageRequest,
) -> Result<Page<JobSummary>, JobStorageError> {
    let client = pool.get().await?;

    let mut values: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
    let where_clause = String::from(
        " WHERE j.company_id = $1 AND j.is_active AND j.status = 'Approved'",
    );
    values.push(Box::new(company_id));

    paged_summaries(&client, where_clause, values, page, "list_company_jobs").await
}

/// The employer's own desk: every posting of their company regardless of
/// status, each with its application count.
#[instrument(skip(pool))]
pub async fn list_employer_jobs(
    pool: &PgPool,
    employer_id: i64,
    page: &PageRequest,
) -> Result<Page<EmployerJobRow>, JobStorageError> {
    let client = pool.get().await?;

    let count_query = format!("SELECT COUNT(*){SUMMARY_FROM} WHERE c.employer_id = $1");
    let total: i64 = client
        .timed_query_one(&count_query, &[&employer_id], "list_employer_jobs")
        .await?
        .get(0);

    let query = format!(
        "{SUMMARY_SELECT}, (SELECT COUNT(*) FROM jx.applications a WHERE a.job_id = j.id) AS application_count
         {SUMMARY_FROM} WHERE c.employer_id = $1
         ORDER BY j.created_at DESC, j.id DESC LIMIT $2 OFFSET $3",
    );
    let rows = client
        .timed_query(
            &query,
            &[&employer_id, &page.limit(), &page.offset()],
            "list_employer_jobs",
        )
        .await?;

    let items = rows
        .iter()
        .map(|row| {
            Ok(EmployerJobRow {
                job: row_to_job_summary(row)?,
                application_count: row.get("application_count"),
            })
        })
        .collect::<Result<Vec<_>, JobStorageError>>()?;
    Ok(Page::new(items, page, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_profile_may_post() {
        assert_eq!(
            company_profile_gap("Acme", Some("We make anvils"), Some("1 Anvil Way"), Some("Hanoi")),
            None
        );
    }

    #[test]
    fn blank_name_blocks_posting() {
        let gap = company_profile_gap("   ", Some("d"), Some("a"), Some("c"));
        assert!(gap.is_some_and(|m| m.contains("company name")));
    }

    #[test]
    fn missing_description_blocks_posting() {
        let gap = company_profile_gap("Acme", None, Some("a"), Some("c"));
        assert!(gap.is_some_and(|m| m.contains("description")));
    }

    #[test]
    fn missing_address_or_city_blocks_posting() {
        for (address, city) in [(None, Some("Hanoi")), (Some("1 Anvil Way"), None)] {
            let gap = company_profile_gap("Acme", Some("d"), address, city);
            assert!(gap.is_some_and(|m| m.contains("address and city")), "{address:?} {city:?}");
        }
    }
}
