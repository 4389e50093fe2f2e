use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};
use crate::schema;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "users",
        sql: schema::USERS_DDL,
    },
    Migration {
        id: 2,
        description: "companies",
        sql: schema::COMPANIES_DDL,
    },
    Migration {
        id: 3,
        description: "categories",
        sql: schema::CATEGORIES_DDL,
    },
    Migration {
        id: 4,
        description: "jobs",
        sql: schema::JOBS_DDL,
    },
    Migration {
        id: 5,
        description: "applications",
        sql: schema::APPLICATIONS_DDL,
    },
    Migration {
        id: 6,
        description: "refresh tokens",
        sql: schema::REFRESH_TOKENS_DDL,
    },
    Migration {
        id: 7,
        description: "job views",
        sql: schema::JOB_VIEWS_DDL,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS jx;
             CREATE TABLE IF NOT EXISTS jx.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM jx.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO jx.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_ids_are_unique_and_ordered() {
        let mut previous = 0;
        for migration in MIGRATIONS {
            assert!(
                migration.id > previous,
                "migration {} is out of order",
                migration.id
            );
            previous = migration.id;
        }
    }
}
