//! Job posting model and its moderation lifecycle.
//!
//! A posting starts as `Pending` and is either approved or rejected by a
//! moderator. Approved postings stay live until the employer closes them or
//! the application deadline passes, at which point they expire. Rejected,
//! closed, and expired postings never come back; an employer who edits an
//! approved posting sends it back through moderation instead.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a posting. Persisted in the `status` column as the
/// variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Approved,
    Rejected,
    Closed,
    Expired,
}

impl JobStatus {
    pub const ALL: &'static [JobStatus] = &[
        JobStatus::Pending,
        JobStatus::Approved,
        JobStatus::Rejected,
        JobStatus::Closed,
        JobStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Approved => "Approved",
            JobStatus::Rejected => "Rejected",
            JobStatus::Closed => "Closed",
            JobStatus::Expired => "Expired",
        }
    }

    pub fn parse(value: &str) -> Option<JobStatus> {
        match value {
            "Pending" => Some(JobStatus::Pending),
            "Approved" => Some(JobStatus::Approved),
            "Rejected" => Some(JobStatus::Rejected),
            "Closed" => Some(JobStatus::Closed),
            "Expired" => Some(JobStatus::Expired),
            _ => None,
        }
    }

    /// Statuses this one may move to. Terminal statuses return an empty
    /// slice.
    pub fn allowed_transitions(&self) -> &'static [JobStatus] {
        match self {
            JobStatus::Pending => &[JobStatus::Approved, JobStatus::Rejected],
            JobStatus::Approved => &[JobStatus::Closed, JobStatus::Expired],
            JobStatus::Rejected | JobStatus::Closed | JobStatus::Expired => &[],
        }
    }

    pub fn can_transition_to(&self, target: JobStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job posting row.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub positions: Option<i32>,
    pub application_deadline: DateTime<Utc>,
    pub status: JobStatus,
    pub view_count: i32,
    pub is_active: bool,
    pub company_id: i64,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_jobs_can_only_be_moderated() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Approved));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Rejected));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Closed));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Expired));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Pending));
    }

    #[test]
    fn approved_jobs_close_or_expire() {
        assert!(JobStatus::Approved.can_transition_to(JobStatus::Closed));
        assert!(JobStatus::Approved.can_transition_to(JobStatus::Expired));
        assert!(!JobStatus::Approved.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Approved.can_transition_to(JobStatus::Rejected));
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        for status in [JobStatus::Rejected, JobStatus::Closed, JobStatus::Expired] {
            assert!(status.is_terminal());
            for target in JobStatus::ALL {
                assert!(
                    !status.can_transition_to(*target),
                    "{status} -> {target} must be rejected"
                );
            }
        }
    }

    #[test]
    fn live_statuses_are_not_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Approved.is_terminal());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in JobStatus::ALL {
            assert_eq!(JobStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(JobStatus::parse("approved"), None);
        assert_eq!(JobStatus::parse(""), None);
    }
}
