//! Wire types for the application endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ApplicationStatus;

/// Body for applying to a posting. When `cv_url` is omitted the CV stored
/// on the applicant profile is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_id: i64,
    pub cover_letter: String,
    #[serde(default)]
    pub cv_url: Option<String>,
}

/// Body for an employer review. The status is sent as a string and parsed
/// against [`ApplicationStatus`] so unknown values fail loudly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Row on the applicant's own list.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub id: i64,
    pub status: ApplicationStatus,
    pub note: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub job_id: i64,
    pub job_title: String,
    pub company_name: String,
}

/// Full application as reviewed by an employer or fetched by id.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub id: i64,
    pub status: ApplicationStatus,
    pub cover_letter: String,
    pub cv_url: Option<String>,
    pub note: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub job_id: i64,
    pub job_title: String,
    pub company_name: String,
    pub applicant_id: i64,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: Option<String>,
}
