use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::api::stats::{ApplicationCounts, DashboardStats, JobCounts, UserCounts};
use crate::db::PgPool;
use crate::db::util::TimedClientExt;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

/// Counts for the admin dashboard. One round trip per table; COUNT FILTER
/// does the slicing.
#[instrument(skip(pool))]
pub async fn fetch_dashboard_stats(pool: &PgPool) -> Result<DashboardStats, StatsError> {
    let client = pool.get().await?;

    let users = client
        .timed_query_one(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_active) AS active,
                    COUNT(*) FILTER (WHERE role = 'Admin') AS admins,
                    COUNT(*) FILTER (WHERE role = 'Employer') AS employers,
                    COUNT(*) FILTER (WHERE role = 'Applicant') AS applicants
             FROM jx.users",
            &[],
            "dashboard_users",
        )
        .await?;

    let jobs = client
        .timed_query_one(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_active) AS active,
                    COUNT(*) FILTER (WHERE status = 'Pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'Approved') AS approved,
                    COUNT(*) FILTER (WHERE status = 'Rejected') AS rejected,
                    COUNT(*) FILTER (WHERE status = 'Closed') AS closed,
                    COUNT(*) FILTER (WHERE status = 'Expired') AS expired,
                    COALESCE(SUM(view_count), 0)::BIGINT AS total_views
             FROM jx.jobs",
            &[],
            "dashboard_jobs",
        )
        .await?;

    let applications = client
        .timed_query_one(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'Pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'Approved') AS approved,
                    COUNT(*) FILTER (WHERE status = 'Interviewing') AS interviewing,
                    COUNT(*) FILTER (WHERE status = 'Accepted') AS accepted,
                    COUNT(*) FILTER (WHERE status = 'Rejected') AS rejected,
                    COUNT(*) FILTER (WHERE status = 'Cancelled') AS cancelled
             FROM jx.applications",
            &[],
            "dashboard_applications",
        )
        .await?;

    Ok(DashboardStats {
        users: UserCounts {
            total: users.get("total"),
            active: users.get("active"),
            admins: users.get("admins"),
            employers: users.get("employers"),
            applicants: users.get("applicants"),
        },
        jobs: JobCounts {
            total: jobs.get("total"),
            active: jobs.get("active"),
            pending: jobs.get("pending"),
            approved: jobs.get("approved"),
            rejected: jobs.get("rejected"),
            closed: jobs.get("closed"),
            expired: jobs.get("expired"),
        },
        applications: ApplicationCounts {
            total: applications.get("total"),
            pending: applications.get("pending"),
            approved: applications.get("approved"),
            interviewing: applications.get("interviewing"),
            accepted: applications.get("accepted"),
            rejected: applications.get("rejected"),
            cancelled: applications.get("cancelled"),
        },
        total_job_views: jobs.get("total_views"),
    })
}
