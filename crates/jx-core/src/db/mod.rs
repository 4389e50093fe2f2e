pub mod applications;
pub mod categories;
pub mod companies;
pub mod job_views;
pub mod jobs;
pub mod migrations;
pub mod pool;
pub mod refresh_tokens;
pub mod stats;
pub mod users;
pub mod util;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use applications::{
    ApplicationStorageError, cancel_application, create_application, employer_owns_application,
    fetch_application, has_applied, list_applications_by_applicant, list_applications_by_employer,
    list_applications_for_job, update_application_status,
};
pub use categories::{
    CategoryStorageError, delete_category, fetch_category, insert_category, list_active_categories,
    list_all_categories, set_category_active, update_category,
};
pub use companies::{CompanyStorageError, fetch_company, fetch_company_by_employer, upsert_company};
pub use job_views::{JobViewStorageError, JobViewer, record_job_view};
pub use jobs::{
    JobStorageError, create_job, employer_owns_job, expire_due_jobs, fetch_job_detail,
    hard_delete_job, list_admin_jobs, list_all_jobs, list_company_jobs, list_employer_jobs,
    list_public_jobs, soft_delete_job, update_job, update_job_status,
};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked};
pub use refresh_tokens::{
    TokenStorageError, fetch_refresh_token, insert_refresh_token, revoke_all_for_user,
    revoke_refresh_token,
};
pub use stats::{StatsError, fetch_dashboard_stats};
pub use users::{
    NewUserRecord, UserStorageError, delete_user, fetch_user_by_email, fetch_user_by_id,
    insert_user, list_users, set_user_active, set_user_role, update_password_hash, update_profile,
};
pub use util::TimedClientExt;
