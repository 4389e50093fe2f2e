//! Admin dashboard counters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCounts {
    pub total: i64,
    pub active: i64,
    pub admins: i64,
    pub employers: i64,
    pub applicants: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCounts {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub closed: i64,
    pub expired: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub interviewing: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub users: UserCounts,
    pub jobs: JobCounts,
    pub applications: ApplicationCounts,
    pub total_job_views: i64,
}
