use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::api::categories::CategoryPayload;
use crate::db::PgPool;
use crate::domain::Category;

#[derive(Debug, thiserror::Error)]
pub enum CategoryStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

fn row_to_category(row: &Row) -> Result<Category, CategoryStorageError> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
    })
}

/// Categories shown to visitors and offered when posting a job.
#[instrument(skip(pool))]
pub async fn list_active_categories(pool: &PgPool) -> Result<Vec<Category>, CategoryStorageError> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT id, name, description, is_active FROM jx.categories WHERE is_active ORDER BY name",
            &[],
        )
        .await?;
    rows.iter().map(row_to_category).collect()
}

#[instrument(skip(pool))]
pub async fn list_all_categories(pool: &PgPool) -> Result<Vec<Category>, CategoryStorageError> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT id, name, description, is_active FROM jx.categories ORDER BY name",
            &[],
        )
        .await?;
    rows.iter().map(row_to_category).collect()
}

#[instrument(skip(pool))]
pub async fn fetch_category(
    pool: &PgPool,
    id: i64,
) -> Result<Option<Category>, CategoryStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached("SELECT id, name, description, is_active FROM jx.categories WHERE id = $1")
        .await?;

    let row = client.query_opt(&stmt, &[&id]).await?;
    row.map(|r| row_to_category(&r)).transpose()
}

#[instrument(skip(pool, payload))]
pub async fn insert_category(
    pool: &PgPool,
    payload: &CategoryPayload,
) -> Result<Category, CategoryStorageError> {
    let client = pool.get().await?;

    let row = client
        .query_one(
            "INSERT INTO jx.categories (name, description)
             VALUES ($1, $2)
             RETURNING id, name, description, is_active",
            &[&payload.name, &payload.description],
        )
        .await?;
    row_to_category(&row)
}

#[instrument(skip(pool, payload))]
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    payload: &CategoryPayload,
) -> Result<bool, CategoryStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.categories SET name = $2, description = $3 WHERE id = $1",
            &[&id, &payload.name, &payload.description],
        )
        .await?;
    Ok(rows > 0)
}

/// Hiding a category takes it out of the public list and blocks new
/// postings; existing jobs keep their reference.
#[instrument(skip(pool))]
pub async fn set_category_active(
    pool: &PgPool,
    id: i64,
    is_active: bool,
) -> Result<bool, CategoryStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.categories SET is_active = $2 WHERE id = $1",
            &[&id, &is_active],
        )
        .await?;
    Ok(rows > 0)
}

/// Remove a category outright. Refused while active postings still point at
/// it; the FK keeps inactive stragglers from being orphaned.
#[instrument(skip(pool))]
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<(), CategoryStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let active_jobs: i64 = tx
        .query_one(
            "SELECT COUNT(*) FROM jx.jobs WHERE category_id = $1 AND is_active",
            &[&id],
        )
        .await?
        .get(0);
    if active_jobs > 0 {
        return Err(CategoryStorageError::Conflict(format!(
            "category {id} has {active_jobs} active jobs and cannot be deleted"
        )));
    }

    let rows = tx
        .execute("DELETE FROM jx.categories WHERE id = $1", &[&id])
        .await?;
    if rows == 0 {
        return Err(CategoryStorageError::NotFound(format!(
            "category {id} not found"
        )));
    }

    tx.commit().await?;
    Ok(())
}
