//! View tracking. One row per counted view, with a 24-hour dedup window so
//! refreshes do not inflate the counter.

use chrono::{DateTime, Duration, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;

const DEDUP_WINDOW_HOURS: i64 = 24;
const MAX_IP_LEN: usize = 45;
const MAX_USER_AGENT_LEN: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum JobViewStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

/// Who is looking at a posting. Logged-in users dedup on their id; anonymous
/// visitors on client IP.
#[derive(Debug, Clone, Default)]
pub struct JobViewer {
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl JobViewer {
    /// Clamps IP and user agent to their column widths.
    pub fn new(
        user_id: Option<i64>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        JobViewer {
            user_id,
            ip_address: ip_address.map(|ip| truncate(ip, MAX_IP_LEN)),
            user_agent: user_agent.map(|ua| truncate(ua, MAX_USER_AGENT_LEN)),
        }
    }

    fn dedup_key(&self) -> Option<ViewerKey<'_>> {
        if let Some(user_id) = self.user_id {
            return Some(ViewerKey::User(user_id));
        }
        match self.ip_address.as_deref() {
            Some(ip) if !ip.is_empty() => Some(ViewerKey::Ip(ip)),
            _ => None,
        }
    }
}

enum ViewerKey<'a> {
    User(i64),
    Ip(&'a str),
}

fn truncate(mut value: String, max: usize) -> String {
    if value.len() > max {
        let mut cut = max;
        while !value.is_char_boundary(cut) {
            cut -= 1;
        }
        value.truncate(cut);
    }
    value
}

/// Record a view and bump the posting's counter, unless the same viewer
/// already counted within the window. Returns whether the view counted.
/// Missing or inactive postings and viewers with no identity never count.
#[instrument(skip(pool, viewer))]
pub async fn record_job_view(
    pool: &PgPool,
    job_id: i64,
    viewer: &JobViewer,
    now: DateTime<Utc>,
) -> Result<bool, JobViewStorageError> {
    let Some(key) = viewer.dedup_key() else {
        return Ok(false);
    };

    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let job = tx
        .query_opt("SELECT is_active FROM jx.jobs WHERE id = $1 FOR UPDATE", &[&job_id])
        .await?;
    let Some(job) = job else {
        return Ok(false);
    };
    if !job.get::<_, bool>("is_active") {
        return Ok(false);
    }

    let window_start = now - Duration::hours(DEDUP_WINDOW_HOURS);
    let already_counted: bool = match key {
        ViewerKey::User(user_id) => {
            tx.query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM jx.job_views
                    WHERE job_id = $1 AND user_id = $2 AND viewed_at >= $3
                 )",
                &[&job_id, &user_id, &window_start],
            )
            .await?
            .get(0)
        }
        ViewerKey::Ip(ip) => {
            tx.query_one(
                "SELECT EXISTS (
                    SELECT 1 FROM jx.job_views
                    WHERE job_id = $1 AND user_id IS NULL AND ip_address = $2 AND viewed_at >= $3
                 )",
                &[&job_id, &ip, &window_start],
            )
            .await?
            .get(0)
        }
    };
    if already_counted {
        return Ok(false);
    }

    tx.execute(
        "INSERT INTO jx.job_views (job_id, user_id, ip_address, user_agent, viewed_at)
         VALUES ($1, $2, $3, $4, $5)",
        &[&job_id, &viewer.user_id, &viewer.ip_address, &viewer.user_agent, &now],
    )
    .await?;
    tx.execute(
        "UPDATE jx.jobs SET view_count = view_count + 1 WHERE id = $1",
        &[&job_id],
    )
    .await?;

    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_in_viewer_dedups_on_user_id() {
        let viewer = JobViewer::new(Some(7), Some("10.0.0.1".to_string()), None);
        assert!(matches!(viewer.dedup_key(), Some(ViewerKey::User(7))));
    }

    #[test]
    fn anonymous_viewer_dedups_on_ip() {
        let viewer = JobViewer::new(None, Some("10.0.0.1".to_string()), None);
        assert!(matches!(viewer.dedup_key(), Some(ViewerKey::Ip("10.0.0.1"))));
    }

    #[test]
    fn viewer_without_identity_has_no_key() {
        assert!(JobViewer::default().dedup_key().is_none());
        let blank_ip = JobViewer::new(None, Some(String::new()), None);
        assert!(blank_ip.dedup_key().is_none());
    }

    #[test]
    fn oversized_fields_are_clamped() {
        let viewer = JobViewer::new(None, Some("x".repeat(100)), Some("y".repeat(1000)));
        assert_eq!(viewer.ip_address.as_deref().map(str::len), Some(MAX_IP_LEN));
        assert_eq!(viewer.user_agent.as_deref().map(str::len), Some(MAX_USER_AGENT_LEN));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let value = "héllo".repeat(20);
        let cut = truncate(value, 7);
        assert!(cut.len() <= 7);
        assert!(cut.starts_with("héllo"));
    }
}
