use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::api::companies::CompanyUpdate;
use crate::db::PgPool;
use crate::domain::Company;

#[derive(Debug, thiserror::Error)]
pub enum CompanyStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

fn row_to_company(row: &Row) -> Result<Company, CompanyStorageError> {
    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        logo_url: row.try_get("logo_url")?,
        website: row.try_get("website")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        employer_id: row.try_get("employer_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[instrument(skip(pool))]
pub async fn fetch_company(pool: &PgPool, id: i64) -> Result<Option<Company>, CompanyStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT id, name, description, logo_url, website, address, city, employer_id, created_at, updated_at
             FROM jx.companies WHERE id = $1",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&id]).await?;
    row.map(|r| row_to_company(&r)).transpose()
}

#[instrument(skip(pool))]
pub async fn fetch_company_by_employer(
    pool: &PgPool,
    employer_id: i64,
) -> Result<Option<Company>, CompanyStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT id, name, description, logo_url, website, address, city, employer_id, created_at, updated_at
             FROM jx.companies WHERE employer_id = $1",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&employer_id]).await?;
    row.map(|r| row_to_company(&r)).transpose()
}

/// Create the employer's company on first save, update it afterwards. One
/// company per employer; the logo survives updates that do not send a
/// replacement.
#[instrument(skip(pool, changes))]
pub async fn upsert_company(
    pool: &PgPool,
    employer_id: i64,
    changes: &CompanyUpdate,
    now: DateTime<Utc>,
) -> Result<Company, CompanyStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "INSERT INTO jx.companies (name, description, logo_url, website, address, city, employer_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (employer_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                logo_url = COALESCE(EXCLUDED.logo_url, companies.logo_url),
                website = EXCLUDED.website,
                address = EXCLUDED.address,
                city = EXCLUDED.city,
                updated_at = $8
             RETURNING id, name, description, logo_url, website, address, city, employer_id, created_at, updated_at",
        )
        .await?;

    let row = client
        .query_one(
            &stmt,
            &[
                &changes.name,
                &changes.description,
                &changes.logo_url,
                &changes.website,
                &changes.address,
                &changes.city,
                &employer_id,
                &now,
            ],
        )
        .await?;
    row_to_company(&row)
}
