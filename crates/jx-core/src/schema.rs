/// Accounts for all three roles. The verify key is stored AES-GCM
/// encrypted; the plaintext never reaches the database.
pub const USERS_DDL: &str = r#"
CREATE TABLE jx.users (
    id BIGSERIAL PRIMARY KEY,
    email VARCHAR(100) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    full_name VARCHAR(100) NOT NULL,
    phone_number VARCHAR(20),

    avatar_url VARCHAR(255),
    cv_url VARCHAR(255),
    skills VARCHAR(500),
    bio VARCHAR(1000),

    role VARCHAR(20) NOT NULL DEFAULT 'Applicant',
    is_active BOOLEAN NOT NULL DEFAULT true,
    verify_key VARCHAR(255),

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ,

    CONSTRAINT chk_user_role CHECK (role IN ('Admin', 'Employer', 'Applicant'))
);

CREATE INDEX idx_users_role_created ON jx.users(role, created_at DESC);
"#;

/// One company profile per employer account. Deleting the account removes
/// the company and, through it, every posting.
pub const COMPANIES_DDL: &str = r#"
CREATE TABLE jx.companies (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    description VARCHAR(2000),
    logo_url VARCHAR(255),
    website VARCHAR(255),
    address VARCHAR(255),
    city VARCHAR(100),

    employer_id BIGINT NOT NULL UNIQUE REFERENCES jx.users(id) ON DELETE CASCADE,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
);
"#;

/// Job categories. RESTRICT on jx.jobs keeps a category alive while any
/// posting still references it.
pub const CATEGORIES_DDL: &str = r#"
CREATE TABLE jx.categories (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    description VARCHAR(500),
    is_active BOOLEAN NOT NULL DEFAULT true
);
"#;

/// Job postings. `status` follows the moderation lifecycle; `is_active`
/// false marks a soft-deleted posting that stays out of every public
/// surface but keeps its history.
pub const JOBS_DDL: &str = r#"
CREATE TABLE jx.jobs (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(200) NOT NULL,
    description TEXT NOT NULL,
    requirements VARCHAR(1000),
    benefits VARCHAR(1000),
    salary_range VARCHAR(100),
    location VARCHAR(100),
    job_type VARCHAR(50),
    positions INTEGER,
    application_deadline TIMESTAMPTZ NOT NULL,

    status VARCHAR(20) NOT NULL DEFAULT 'Pending',
    view_count INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,

    company_id BIGINT NOT NULL REFERENCES jx.companies(id) ON DELETE CASCADE,
    category_id BIGINT NOT NULL REFERENCES jx.categories(id) ON DELETE RESTRICT,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ,

    CONSTRAINT chk_job_status CHECK (status IN ('Pending', 'Approved', 'Rejected', 'Closed', 'Expired')),
    CONSTRAINT chk_view_count CHECK (view_count >= 0)
);

CREATE INDEX idx_jobs_public_listing ON jx.jobs(status, is_active, created_at DESC);
CREATE INDEX idx_jobs_company_created ON jx.jobs(company_id, created_at DESC);
CREATE INDEX idx_jobs_category ON jx.jobs(category_id) WHERE is_active;
CREATE INDEX idx_jobs_deadline ON jx.jobs(application_deadline) WHERE status = 'Approved';
"#;

/// Applications. The UNIQUE pair backs the one-application-per-job rule and
/// doubles as the race guard for concurrent submissions.
pub const APPLICATIONS_DDL: &str = r#"
CREATE TABLE jx.applications (
    id BIGSERIAL PRIMARY KEY,
    cover_letter VARCHAR(1000) NOT NULL,
    cv_url VARCHAR(255),
    status VARCHAR(20) NOT NULL DEFAULT 'Pending',
    note VARCHAR(500),

    job_id BIGINT NOT NULL REFERENCES jx.jobs(id) ON DELETE CASCADE,
    applicant_id BIGINT NOT NULL REFERENCES jx.users(id) ON DELETE CASCADE,

    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    reviewed_at TIMESTAMPTZ,

    CONSTRAINT uq_applications_job_applicant UNIQUE (job_id, applicant_id),
    CONSTRAINT chk_application_status CHECK (status IN ('Pending', 'Approved', 'Interviewing', 'Accepted', 'Rejected', 'Cancelled'))
);

CREATE INDEX idx_applications_applicant ON jx.applications(applicant_id, applied_at DESC);
CREATE INDEX idx_applications_job_status ON jx.applications(job_id, status);
"#;

/// Server-side refresh tokens. Rows survive revocation so a replayed token
/// can be told apart from a made-up one in the logs.
pub const REFRESH_TOKENS_DDL: &str = r#"
CREATE TABLE jx.refresh_tokens (
    id BIGSERIAL PRIMARY KEY,
    token VARCHAR(500) NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    is_revoked BOOLEAN NOT NULL DEFAULT false,
    revoked_at TIMESTAMPTZ,

    user_id BIGINT NOT NULL REFERENCES jx.users(id) ON DELETE CASCADE,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_refresh_tokens_token ON jx.refresh_tokens(token);
CREATE INDEX idx_refresh_tokens_user_live ON jx.refresh_tokens(user_id) WHERE NOT is_revoked;
"#;

/// View log backing the 24h dedup window. One of user_id / ip_address
/// identifies the viewer; both indexes serve the window existence probe.
pub const JOB_VIEWS_DDL: &str = r#"
CREATE TABLE jx.job_views (
    id BIGSERIAL PRIMARY KEY,
    job_id BIGINT NOT NULL REFERENCES jx.jobs(id) ON DELETE CASCADE,
    user_id BIGINT REFERENCES jx.users(id) ON DELETE SET NULL,
    ip_address VARCHAR(45),
    user_agent VARCHAR(500),
    viewed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_job_views_user_window ON jx.job_views(job_id, user_id, viewed_at DESC);
CREATE INDEX idx_job_views_ip_window ON jx.job_views(job_id, ip_address, viewed_at DESC);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_schema_covers_auth_and_profile_columns() {
        for required in [
            "email VARCHAR(100) NOT NULL UNIQUE",
            "password_hash",
            "full_name",
            "verify_key",
            "is_active",
            "chk_user_role",
            "idx_users_role_created",
        ] {
            assert!(USERS_DDL.contains(required), "missing: {required}");
        }
    }

    #[test]
    fn companies_schema_ties_one_company_to_one_employer() {
        for required in [
            "name VARCHAR(200) NOT NULL",
            "employer_id BIGINT NOT NULL UNIQUE REFERENCES jx.users(id) ON DELETE CASCADE",
            "logo_url",
            "city",
        ] {
            assert!(COMPANIES_DDL.contains(required), "missing: {required}");
        }
    }

    #[test]
    fn jobs_schema_contains_lifecycle_checks_and_indexes() {
        for required in [
            "application_deadline TIMESTAMPTZ NOT NULL",
            "status VARCHAR(20) NOT NULL DEFAULT 'Pending'",
            "view_count INTEGER NOT NULL DEFAULT 0",
            "company_id BIGINT NOT NULL REFERENCES jx.companies(id) ON DELETE CASCADE",
            "category_id BIGINT NOT NULL REFERENCES jx.categories(id) ON DELETE RESTRICT",
            "chk_job_status",
            "chk_view_count",
            "idx_jobs_public_listing",
            "idx_jobs_company_created",
            "idx_jobs_deadline",
        ] {
            assert!(JOBS_DDL.contains(required), "missing: {required}");
        }
    }

    #[test]
    fn applications_schema_enforces_single_application_per_job() {
        for required in [
            "UNIQUE (job_id, applicant_id)",
            "chk_application_status",
            "'Interviewing'",
            "'Cancelled'",
            "reviewed_at",
            "idx_applications_applicant",
            "idx_applications_job_status",
        ] {
            assert!(APPLICATIONS_DDL.contains(required), "missing: {required}");
        }
    }

    #[test]
    fn refresh_tokens_schema_supports_revocation() {
        for required in [
            "token VARCHAR(500) NOT NULL",
            "is_revoked",
            "revoked_at",
            "idx_refresh_tokens_token",
            "idx_refresh_tokens_user_live",
        ] {
            assert!(REFRESH_TOKENS_DDL.contains(required), "missing: {required}");
        }
    }

    #[test]
    fn job_views_schema_serves_both_dedup_probes() {
        for required in [
            "ip_address VARCHAR(45)",
            "user_agent VARCHAR(500)",
            "ON DELETE SET NULL",
            "idx_job_views_user_window",
            "idx_job_views_ip_window",
        ] {
            assert!(JOB_VIEWS_DDL.contains(required), "missing: {required}");
        }
    }
}
