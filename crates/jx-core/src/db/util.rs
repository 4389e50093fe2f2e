#![allow(async_fn_in_trait)]

use deadpool_postgres::GenericClient;
use std::{sync::OnceLock, time::Instant};
use tokio_postgres::ToStatement;
use tracing::warn;

fn slow_query_threshold_ms() -> Option<u64> {
    static CACHE: OnceLock<Option<u64>> = OnceLock::new();

    *CACHE.get_or_init(|| {
        std::env::var("JX_DB_LOG_MIN_DURATION_MS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(|v| v.max(0) as u64)
            .filter(|v| *v > 0)
    })
}

fn maybe_log_slow_query(label: &str, started_at: Instant) {
    if let Some(threshold_ms) = slow_query_threshold_ms() {
        let elapsed = started_at.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        if elapsed_ms >= threshold_ms {
            warn!(query = label, elapsed_ms, "slow_query_detected");
        }
    }
}

/// Query helpers that report slow statements when
/// `JX_DB_LOG_MIN_DURATION_MS` is set. Used on the listing and aggregate
/// paths, which are the only ones that get heavy in practice.
pub trait TimedClientExt: GenericClient {
    async fn timed_query<S>(
        &self,
        statement: &S,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
        label: &str,
    ) -> Result<Vec<tokio_postgres::Row>, tokio_postgres::Error>
    where
        S: ToStatement + Sync + Send + ?Sized,
    {
        let started = Instant::now();
        let result = self.query(statement, params).await;
        maybe_log_slow_query(label, started);
        result
    }

    async fn timed_query_one<S>(
        &self,
        statement: &S,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
        label: &str,
    ) -> Result<tokio_postgres::Row, tokio_postgres::Error>
    where
        S: ToStatement + Sync + Send + ?Sized,
    {
        let started = Instant::now();
        let result = self.query_one(statement, params).await;
        maybe_log_slow_query(label, started);
        result
    }

    async fn timed_execute<S>(
        &self,
        statement: &S,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
        label: &str,
    ) -> Result<u64, tokio_postgres::Error>
    where
        S: ToStatement + Sync + Send + ?Sized,
    {
        let started = Instant::now();
        let result = self.execute(statement, params).await;
        maybe_log_slow_query(label, started);
        result
    }
}

impl<T: GenericClient + ?Sized> TimedClientExt for T {}
