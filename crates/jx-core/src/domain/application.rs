//! Job application model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status of an application. Persisted in the `status` column as the
/// variant name.
///
/// Unlike job statuses these carry no transition rules: an employer may move
/// an application between any of them while reviewing, except that
/// `Cancelled` is normally set by the applicant withdrawing a pending
/// application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Interviewing,
    Accepted,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const ALL: &'static [ApplicationStatus] = &[
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<ApplicationStatus> {
        match value {
            "Pending" => Some(ApplicationStatus::Pending),
            "Approved" => Some(ApplicationStatus::Approved),
            "Interviewing" => Some(ApplicationStatus::Interviewing),
            "Accepted" => Some(ApplicationStatus::Accepted),
            "Rejected" => Some(ApplicationStatus::Rejected),
            "Cancelled" => Some(ApplicationStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An application row.
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub id: i64,
    pub cover_letter: String,
    pub cv_url: Option<String>,
    pub status: ApplicationStatus,
    pub note: Option<String>,
    pub job_id: i64,
    pub applicant_id: i64,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(ApplicationStatus::parse("pending"), None);
        assert_eq!(ApplicationStatus::parse("Withdrawn"), None);
    }
}
