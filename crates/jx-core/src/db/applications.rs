//! Application storage. Creation runs its duplicate and eligibility checks
//! in one transaction; the UNIQUE (job_id, applicant_id) pair has the final
//! word on duplicates under concurrency.

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::api::applications::{ApplicationDetail, ApplicationSummary, NewApplication};
use crate::db::PgPool;
use crate::db::util::TimedClientExt;
use crate::domain::{Application, ApplicationStatus, JobStatus};
use crate::pagination::{Page, PageRequest};

#[derive(Debug, thiserror::Error)]
pub enum ApplicationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map application row: {0}")]
    Mapping(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

fn parse_application_status(value: &str) -> Result<ApplicationStatus, ApplicationStorageError> {
    ApplicationStatus::parse(value)
        .ok_or_else(|| ApplicationStorageError::Mapping(format!("unknown application status: {value}")))
}

fn parse_job_status(value: &str) -> Result<JobStatus, ApplicationStorageError> {
    JobStatus::parse(value)
        .ok_or_else(|| ApplicationStorageError::Mapping(format!("unknown job status: {value}")))
}

fn row_to_application(row: &Row) -> Result<Application, ApplicationStorageError> {
    Ok(Application {
        id: row.try_get("id")?,
        cover_letter: row.try_get("cover_letter")?,
        cv_url: row.try_get("cv_url")?,
        status: parse_application_status(row.try_get::<_, String>("status")?.as_str())?,
        note: row.try_get("note")?,
        job_id: row.try_get("job_id")?,
        applicant_id: row.try_get("applicant_id")?,
        applied_at: row.try_get("applied_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}

fn row_to_summary(row: &Row) -> Result<ApplicationSummary, ApplicationStorageError> {
    Ok(ApplicationSummary {
        id: row.get("id"),
        status: parse_application_status(row.try_get::<_, String>("status")?.as_str())?,
        note: row.get("note"),
        applied_at: row.get("applied_at"),
        reviewed_at: row.get("reviewed_at"),
        job_id: row.get("job_id"),
        job_title: row.get("job_title"),
        company_name: row.get("company_name"),
    })
}

fn row_to_detail(row: &Row) -> Result<ApplicationDetail, ApplicationStorageError> {
    Ok(ApplicationDetail {
        id: row.try_get("id")?,
        status: parse_application_status(row.try_get::<_, String>("status")?.as_str())?,
        cover_letter: row.try_get("cover_letter")?,
        cv_url: row.try_get("cv_url")?,
        note: row.try_get("note")?,
        applied_at: row.try_get("applied_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
        job_id: row.try_get("job_id")?,
        job_title: row.try_get("job_title")?,
        company_name: row.try_get("company_name")?,
        applicant_id: row.try_get("applicant_id")?,
        applicant_name: row.try_get("applicant_name")?,
        applicant_email: row.try_get("applicant_email")?,
        applicant_phone: row.try_get("applicant_phone")?,
    })
}

const DETAIL_SELECT: &str = "SELECT a.id, a.status, a.cover_letter, a.cv_url, a.note, a.applied_at, a.reviewed_at, a.job_id, j.title AS job_title, c.name AS company_name, a.applicant_id, u.full_name AS applicant_name, u.email AS applicant_email, u.phone_number AS applicant_phone";

const DETAIL_FROM: &str = " FROM jx.applications a JOIN jx.jobs j ON j.id = a.job_id JOIN jx.companies c ON c.id = j.company_id JOIN jx.users u ON u.id = a.applicant_id";

/// Whether a posting can take a new application right now. Each refusal
/// carries the message shown to the applicant.
fn ensure_job_open(
    status: JobStatus,
    is_active: bool,
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ApplicationStorageError> {
    if !is_active {
        return Err(ApplicationStorageError::Conflict(
            "this job has been closed or removed".to_string(),
        ));
    }
    match status {
        JobStatus::Closed => Err(ApplicationStorageError::Conflict(
            "this job was closed by the employer".to_string(),
        )),
        JobStatus::Expired => Err(ApplicationStorageError::Conflict(
            "this job has expired".to_string(),
        )),
        JobStatus::Rejected => Err(ApplicationStorageError::Conflict(
            "this job was rejected by moderation".to_string(),
        )),
        JobStatus::Pending => Err(ApplicationStorageError::Conflict(
            "this job has not been approved yet".to_string(),
        )),
        JobStatus::Approved if deadline < now => Err(ApplicationStorageError::Conflict(
            "the application deadline for this job has passed".to_string(),
        )),
        JobStatus::Approved => Ok(()),
    }
}

/// File an application. When the request carries no CV the one stored on
/// the applicant profile is used.
#[instrument(skip(pool, request))]
pub async fn create_application(
    pool: &PgPool,
    applicant_id: i64,
    request: &NewApplication,
    now: DateTime<Utc>,
) -> Result<Application, ApplicationStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let duplicate: bool = tx
        .query_one(
            "SELECT EXISTS (
                SELECT 1 FROM jx.applications WHERE job_id = $1 AND applicant_id = $2
             )",
            &[&request.job_id, &applicant_id],
        )
        .await?
        .get(0);
    if duplicate {
        return Err(ApplicationStorageError::Conflict(
            "you have already applied to this job".to_string(),
        ));
    }

    let job = tx
        .query_opt(
            "SELECT status, is_active, application_deadline FROM jx.jobs WHERE id = $1 FOR UPDATE",
            &[&request.job_id],
        )
        .await?;
    let Some(job) = job else {
        return Err(ApplicationStorageError::NotFound(format!(
            "job {} not found",
            request.job_id
        )));
    };

    let status = parse_job_status(job.try_get::<_, String>("status")?.as_str())?;
    ensure_job_open(
        status,
        job.try_get("is_active")?,
        job.try_get("application_deadline")?,
        now,
    )?;

    let cv_url = match request.cv_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Some(url.to_string()),
        _ => {
            tx.query_one("SELECT cv_url FROM jx.users WHERE id = $1", &[&applicant_id])
                .await?
                .try_get("cv_url")?
        }
    };

    let row = tx
        .query_opt(
            "INSERT INTO jx.applications (cover_letter, cv_url, status, job_id, applicant_id, applied_at)
             VALUES ($1, $2, 'Pending', $3, $4, $5)
             ON CONFLICT (job_id, applicant_id) DO NOTHING
             RETURNING id, cover_letter, cv_url, status, note, job_id, applicant_id, applied_at, reviewed_at",
            &[
                &request.cover_letter,
                &cv_url,
                &request.job_id,
                &applicant_id,
                &now,
            ],
        )
        .await?;
    let Some(row) = row else {
        return Err(ApplicationStorageError::Conflict(
            "you have already applied to this job".to_string(),
        ));
    };
    let application = row_to_application(&row)?;

    tx.commit().await?;
    Ok(application)
}

#[instrument(skip(pool))]
pub async fn fetch_application(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ApplicationDetail>, ApplicationStorageError> {
    let client = pool.get().await?;

    let query = format!("{DETAIL_SELECT}{DETAIL_FROM} WHERE a.id = $1");
    let row = client.query_opt(&query, &[&id]).await?;
    row.map(|r| row_to_detail(&r)).transpose()
}

/// The applicant's own history, newest first.
#[instrument(skip(pool))]
pub async fn list_applications_by_applicant(
    pool: &PgPool,
    applicant_id: i64,
    page: &PageRequest,
) -> Result<Page<ApplicationSummary>, ApplicationStorageError> {
    let client = pool.get().await?;

    let total: i64 = client
        .timed_query_one(
            "SELECT COUNT(*) FROM jx.applications WHERE applicant_id = $1",
            &[&applicant_id],
            "list_applications_by_applicant",
        )
        .await?
        .get(0);

    let rows = client
        .timed_query(
            "SELECT a.id, a.status, a.note, a.applied_at, a.reviewed_at, a.job_id, j.title AS job_title, c.name AS company_name
             FROM jx.applications a
             JOIN jx.jobs j ON j.id = a.job_id
             JOIN jx.companies c ON c.id = j.company_id
             WHERE a.applicant_id = $1
             ORDER BY a.applied_at DESC, a.id DESC LIMIT $2 OFFSET $3",
            &[&applicant_id, &page.limit(), &page.offset()],
            "list_applications_by_applicant",
        )
        .await?;

    let items = rows.iter().map(row_to_summary).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total))
}

/// Every application on one posting. Ownership of the posting is checked by
/// the caller.
#[instrument(skip(pool))]
pub async fn list_applications_for_job(
    pool: &PgPool,
    job_id: i64,
    page: &PageRequest,
) -> Result<Page<ApplicationDetail>, ApplicationStorageError> {
    let client = pool.get().await?;

    let total: i64 = client
        .timed_query_one(
            "SELECT COUNT(*) FROM jx.applications WHERE job_id = $1",
            &[&job_id],
            "list_applications_for_job",
        )
        .await?
        .get(0);

    let query = format!(
        "{DETAIL_SELECT}{DETAIL_FROM} WHERE a.job_id = $1
         ORDER BY a.applied_at DESC, a.id DESC LIMIT $2 OFFSET $3"
    );
    let rows = client
        .timed_query(
            &query,
            &[&job_id, &page.limit(), &page.offset()],
            "list_applications_for_job",
        )
        .await?;

    let items = rows.iter().map(row_to_detail).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total))
}

/// Every application across all of the employer's postings.
#[instrument(skip(pool))]
pub async fn list_applications_by_employer(
    pool: &PgPool,
    employer_id: i64,
    page: &PageRequest,
) -> Result<Page<ApplicationDetail>, ApplicationStorageError> {
    let client = pool.get().await?;

    let total: i64 = client
        .timed_query_one(
            "SELECT COUNT(*)
             FROM jx.applications a
             JOIN jx.jobs j ON j.id = a.job_id
             JOIN jx.companies c ON c.id = j.company_id
             WHERE c.employer_id = $1",
            &[&employer_id],
            "list_applications_by_employer",
        )
        .await?
        .get(0);

    let query = format!(
        "{DETAIL_SELECT}{DETAIL_FROM} WHERE c.employer_id = $1
         ORDER BY a.applied_at DESC, a.id DESC LIMIT $2 OFFSET $3"
    );
    let rows = client
        .timed_query(
            &query,
            &[&employer_id, &page.limit(), &page.offset()],
            "list_applications_by_employer",
        )
        .await?;

    let items = rows.iter().map(row_to_detail).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total))
}

/// Employer review. Any known status is accepted; applications have no
/// transition table.
#[instrument(skip(pool, note))]
pub async fn update_application_status(
    pool: &PgPool,
    application_id: i64,
    status: ApplicationStatus,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), ApplicationStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.applications SET status = $2, note = $3, reviewed_at = $4 WHERE id = $1",
            &[&application_id, &status.as_str(), &note, &now],
        )
        .await?;
    if rows == 0 {
        return Err(ApplicationStorageError::NotFound(format!(
            "application {application_id} not found"
        )));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn employer_owns_application(
    pool: &PgPool,
    application_id: i64,
    employer_id: i64,
) -> Result<bool, ApplicationStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT EXISTS (
                SELECT 1 FROM jx.applications a
                JOIN jx.jobs j ON j.id = a.job_id
                JOIN jx.companies c ON c.id = j.company_id
                WHERE a.id = $1 AND c.employer_id = $2
             )",
        )
        .await?;
    let row = client.query_one(&stmt, &[&application_id, &employer_id]).await?;
    Ok(row.get(0))
}

/// Applicant withdrawal. Only the owner may cancel, and only while the
/// application is still pending; returns false otherwise.
#[instrument(skip(pool))]
pub async fn cancel_application(
    pool: &PgPool,
    application_id: i64,
    applicant_id: i64,
    now: DateTime<Utc>,
) -> Result<bool, ApplicationStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.applications SET status = 'Cancelled', reviewed_at = $3
             WHERE id = $1 AND applicant_id = $2 AND status = 'Pending'",
            &[&application_id, &applicant_id, &now],
        )
        .await?;
    Ok(rows > 0)
}

#[instrument(skip(pool))]
pub async fn has_applied(
    pool: &PgPool,
    applicant_id: i64,
    job_id: i64,
) -> Result<bool, ApplicationStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT EXISTS (
                SELECT 1 FROM jx.applications WHERE applicant_id = $1 AND job_id = $2
             )",
        )
        .await?;
    let row = client.query_one(&stmt, &[&applicant_id, &job_id]).await?;
    Ok(row.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn far_deadline(now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(7)
    }

    #[test]
    fn open_approved_job_accepts_applications() {
        let now = Utc::now();
        assert!(ensure_job_open(JobStatus::Approved, true, far_deadline(now), now).is_ok());
    }

    #[test]
    fn inactive_job_is_closed_to_applications() {
        let now = Utc::now();
        let err = ensure_job_open(JobStatus::Approved, false, far_deadline(now), now).unwrap_err();
        assert!(err.to_string().contains("closed or removed"));
    }

    #[test]
    fn each_blocked_status_gets_its_own_message() {
        let now = Utc::now();
        let cases = [
            (JobStatus::Closed, "closed by the employer"),
            (JobStatus::Expired, "has expired"),
            (JobStatus::Rejected, "rejected by moderation"),
            (JobStatus::Pending, "not been approved"),
        ];
        for (status, needle) in cases {
            let err = ensure_job_open(status, true, far_deadline(now), now).unwrap_err();
            assert!(
                matches!(err, ApplicationStorageError::Conflict(_)),
                "{status} must refuse with a conflict"
            );
            assert!(err.to_string().contains(needle), "{status}: {err}");
        }
    }

    #[test]
    fn passed_deadline_blocks_applications() {
        let now = Utc::now();
        let err =
            ensure_job_open(JobStatus::Approved, true, now - Duration::minutes(1), now).unwrap_err();
        assert!(err.to_string().contains("deadline"));
    }
}
