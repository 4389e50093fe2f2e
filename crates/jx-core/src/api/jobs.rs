//! Wire types for the job endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::companies::CompanyCard;
use crate::domain::JobStatus;

/// Body for creating or editing a posting. Edits replace every field, so
/// clients send the whole posting back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub positions: Option<i32>,
    pub application_deadline: DateTime<Utc>,
    pub category_id: i64,
}

/// Filters accepted by the public catalogue. `search` matches title,
/// description, and company name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Listing row.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: i64,
    pub title: String,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub status: JobStatus,
    pub is_active: bool,
    pub view_count: i32,
    pub application_deadline: DateTime<Utc>,
    pub company_name: String,
    pub company_logo_url: Option<String>,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
}

/// Employer listing row: the posting plus how many applications it drew.
#[derive(Debug, Clone, Serialize)]
pub struct EmployerJobRow {
    pub job: JobSummary,
    pub application_count: i64,
}

/// Full posting as rendered on a details page.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
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
    pub company: CompanyCard,
    pub category_id: i64,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_fields_are_all_optional() {
        let filter: JobFilter = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(filter.search.is_none());
        assert!(filter.category_id.is_none());
        assert!(filter.location.is_none());
    }

    #[test]
    fn payload_accepts_minimal_posting() {
        let payload: JobPayload = serde_json::from_value(serde_json::json!({
            "title": "Backend Engineer",
            "description": "Build the thing",
            "application_deadline": "2026-12-31T00:00:00Z",
            "category_id": 3
        }))
        .unwrap();
        assert_eq!(payload.title, "Backend Engineer");
        assert!(payload.positions.is_none());
    }
}
