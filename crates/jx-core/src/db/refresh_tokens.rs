use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::PgPool;
use crate::domain::RefreshToken;

#[derive(Debug, thiserror::Error)]
pub enum TokenStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

fn row_to_refresh_token(row: &Row) -> Result<RefreshToken, TokenStorageError> {
    Ok(RefreshToken {
        id: row.try_get("id")?,
        token: row.try_get("token")?,
        expires_at: row.try_get("expires_at")?,
        is_revoked: row.try_get("is_revoked")?,
        revoked_at: row.try_get("revoked_at")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[instrument(skip(pool, token))]
pub async fn insert_refresh_token(
    pool: &PgPool,
    user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TokenStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "INSERT INTO jx.refresh_tokens (token, expires_at, user_id, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .await?;
    client
        .execute(&stmt, &[&token, &expires_at, &user_id, &now])
        .await?;
    Ok(())
}

/// Look a presented token up under its owner. Revoked and expired rows are
/// returned as-is; the auth flow decides what to do with them.
#[instrument(skip(pool, token))]
pub async fn fetch_refresh_token(
    pool: &PgPool,
    user_id: i64,
    token: &str,
) -> Result<Option<RefreshToken>, TokenStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT id, token, expires_at, is_revoked, revoked_at, user_id, created_at
             FROM jx.refresh_tokens
             WHERE user_id = $1 AND token = $2
             LIMIT 1",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&user_id, &token]).await?;
    row.map(|r| row_to_refresh_token(&r)).transpose()
}

/// Revoke one token. Returns false when the token is unknown or already
/// revoked.
#[instrument(skip(pool, token))]
pub async fn revoke_refresh_token(
    pool: &PgPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<bool, TokenStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.refresh_tokens SET is_revoked = true, revoked_at = $2
             WHERE token = $1 AND NOT is_revoked",
            &[&token, &now],
        )
        .await?;
    Ok(rows > 0)
}

/// Kill every live session of one user. Used by single-session logins and
/// by account deactivation.
#[instrument(skip(pool))]
pub async fn revoke_all_for_user(
    pool: &PgPool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<u64, TokenStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.refresh_tokens SET is_revoked = true, revoked_at = $2
             WHERE user_id = $1 AND NOT is_revoked",
            &[&user_id, &now],
        )
        .await?;
    Ok(rows)
}
