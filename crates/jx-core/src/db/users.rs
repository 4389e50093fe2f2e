use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::instrument;

use crate::api::users::{ProfileUpdate, UserFilter, UserSummary};
use crate::db::PgPool;
use crate::db::util::TimedClientExt;
use crate::domain::{Role, User};
use crate::pagination::{Page, PageRequest};

#[derive(Debug, thiserror::Error)]
pub enum UserStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map user row: {0}")]
    Mapping(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Column values for a fresh account. The password hash and the encrypted
/// verify key are produced by the auth flow before this reaches storage.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub verify_key: Option<String>,
}

fn parse_role(value: &str) -> Result<Role, UserStorageError> {
    Role::parse(value).ok_or_else(|| UserStorageError::Mapping(format!("unknown role: {value}")))
}

fn row_to_user(row: &Row) -> Result<User, UserStorageError> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        phone_number: row.try_get("phone_number")?,
        avatar_url: row.try_get("avatar_url")?,
        cv_url: row.try_get("cv_url")?,
        skills: row.try_get("skills")?,
        bio: row.try_get("bio")?,
        role: parse_role(row.try_get::<_, String>("role")?.as_str())?,
        is_active: row.try_get("is_active")?,
        verify_key: row.try_get("verify_key")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_user_summary(row: &Row) -> Result<UserSummary, UserStorageError> {
    Ok(UserSummary {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        phone_number: row.get("phone_number"),
        role: parse_role(row.try_get::<_, String>("role")?.as_str())?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

/// Insert a new account. The unique index on email is the source of truth
/// for duplicates; losing a race surfaces as `Conflict`.
#[instrument(skip(pool, record))]
pub async fn insert_user(
    pool: &PgPool,
    record: &NewUserRecord,
    now: DateTime<Utc>,
) -> Result<User, UserStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "INSERT INTO jx.users (email, password_hash, full_name, phone_number, role, verify_key, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (email) DO NOTHING
             RETURNING id, email, password_hash, full_name, phone_number, avatar_url, cv_url, skills, bio, role, is_active, verify_key, created_at, updated_at",
        )
        .await?;

    let row = client
        .query_opt(
            &stmt,
            &[
                &record.email,
                &record.password_hash,
                &record.full_name,
                &record.phone_number,
                &record.role.as_str(),
                &record.verify_key,
                &now,
            ],
        )
        .await?;

    match row {
        Some(row) => row_to_user(&row),
        None => Err(UserStorageError::Conflict(format!(
            "email {} is already registered",
            record.email
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn fetch_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, UserStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT id, email, password_hash, full_name, phone_number, avatar_url, cv_url, skills, bio, role, is_active, verify_key, created_at, updated_at
             FROM jx.users WHERE email = $1",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&email]).await?;
    row.map(|r| row_to_user(&r)).transpose()
}

#[instrument(skip(pool))]
pub async fn fetch_user_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, UserStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "SELECT id, email, password_hash, full_name, phone_number, avatar_url, cv_url, skills, bio, role, is_active, verify_key, created_at, updated_at
             FROM jx.users WHERE id = $1",
        )
        .await?;

    let row = client.query_opt(&stmt, &[&id]).await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Update the fields a user maintains themselves. Avatar and CV URLs are
/// preserved unless a replacement is sent.
#[instrument(skip(pool, changes))]
pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    changes: &ProfileUpdate,
    now: DateTime<Utc>,
) -> Result<bool, UserStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "UPDATE jx.users SET
                full_name = $2,
                phone_number = $3,
                skills = $4,
                bio = $5,
                avatar_url = COALESCE($6, avatar_url),
                cv_url = COALESCE($7, cv_url),
                updated_at = $8
             WHERE id = $1",
        )
        .await?;

    let rows = client
        .execute(
            &stmt,
            &[
                &user_id,
                &changes.full_name,
                &changes.phone_number,
                &changes.skills,
                &changes.bio,
                &changes.avatar_url,
                &changes.cv_url,
                &now,
            ],
        )
        .await?;
    Ok(rows > 0)
}

#[instrument(skip(pool, password_hash))]
pub async fn update_password_hash(
    pool: &PgPool,
    user_id: i64,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<bool, UserStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.users SET password_hash = $2, updated_at = $3 WHERE id = $1",
            &[&user_id, &password_hash, &now],
        )
        .await?;
    Ok(rows > 0)
}

#[instrument(skip(pool))]
pub async fn set_user_active(
    pool: &PgPool,
    user_id: i64,
    is_active: bool,
    now: DateTime<Utc>,
) -> Result<bool, UserStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.users SET is_active = $2, updated_at = $3 WHERE id = $1",
            &[&user_id, &is_active, &now],
        )
        .await?;
    Ok(rows > 0)
}

#[instrument(skip(pool))]
pub async fn set_user_role(
    pool: &PgPool,
    user_id: i64,
    role: Role,
    now: DateTime<Utc>,
) -> Result<bool, UserStorageError> {
    let client = pool.get().await?;

    let rows = client
        .execute(
            "UPDATE jx.users SET role = $2, updated_at = $3 WHERE id = $1",
            &[&user_id, &role.as_str(), &now],
        )
        .await?;
    Ok(rows > 0)
}

/// Hard-delete an account. Admin accounts are refused. The company,
/// postings, applications, tokens, and view rows all go with the account
/// through FK cascades.
#[instrument(skip(pool))]
pub async fn delete_user(pool: &PgPool, user_id: i64) -> Result<bool, UserStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_opt("SELECT role FROM jx.users WHERE id = $1 FOR UPDATE", &[&user_id])
        .await?;
    let Some(row) = row else {
        return Ok(false);
    };

    let role = parse_role(row.try_get::<_, String>("role")?.as_str())?;
    if role == Role::Admin {
        return Err(UserStorageError::Conflict(format!(
            "user {user_id} is an admin and cannot be deleted"
        )));
    }

    tx.execute("DELETE FROM jx.users WHERE id = $1", &[&user_id])
        .await?;
    tx.commit().await?;
    Ok(true)
}

#[instrument(skip(pool))]
pub async fn list_users(
    pool: &PgPool,
    filter: &UserFilter,
    page: &PageRequest,
) -> Result<Page<UserSummary>, UserStorageError> {
    let client = pool.get().await?;

    let mut values: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
    let mut where_clause = String::from(" WHERE 1=1");

    if let Some(role) = &filter.role {
        where_clause.push_str(&format!(" AND role = ${}", values.len() + 1));
        values.push(Box::new(role.clone()));
    }

    if let Some(is_active) = filter.is_active {
        where_clause.push_str(&format!(" AND is_active = ${}", values.len() + 1));
        values.push(Box::new(is_active));
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let position = values.len() + 1;
        where_clause.push_str(&format!(
            " AND (email ILIKE ${position} OR full_name ILIKE ${position})"
        ));
        values.push(Box::new(format!("%{search}%")));
    }

    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect();
    let count_query = format!("SELECT COUNT(*) FROM jx.users{where_clause}");
    let total: i64 = client
        .timed_query_one(&count_query, &params, "count_users")
        .await?
        .get(0);

    let query = format!(
        "SELECT id, email, full_name, phone_number, role, is_active, created_at
         FROM jx.users{where_clause}
         ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
        values.len() + 1,
        values.len() + 2
    );
    values.push(Box::new(page.limit()));
    values.push(Box::new(page.offset()));

    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect();
    let rows = client.timed_query(&query, &params, "list_users").await?;

    let items = rows
        .iter()
        .map(row_to_user_summary)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, page, total))
}
