//! Audit persistence for advise calls

use sqlx::sqlite::SqliteQueryResult;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::error::AdvisorResult;
use crate::models::AdviceRecord;

/// Argument bound to an `execute` statement
#[derive(Debug, Clone)]
pub enum SqlArg {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlArg {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[derive(Clone)]
pub struct AdviceRepository {
    pool: SqlitePool,
}

impl AdviceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Execute one statement on a connection taken from the pool
    ///
    /// The connection goes back to the pool when it is dropped, whichever
    /// way this function returns.
    pub async fn execute(&self, command: &str, args: &[SqlArg]) -> AdvisorResult<SqliteQueryResult> {
        let mut conn = self.pool.acquire().await?;

        let mut query = sqlx::query(command);
        for arg in args {
            query = match arg {
                SqlArg::Int(v) => query.bind(*v),
                SqlArg::Text(v) => query.bind(v.clone()),
            };
        }

        Ok(query.execute(&mut *conn).await?)
    }

    /// Begin a transaction for callers composing several statements
    pub async fn transaction(&self) -> AdvisorResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Append one audit row
    pub async fn save(
        &self,
        db_id: i64,
        sql_text: &str,
        advice: &str,
        message: &str,
    ) -> AdvisorResult<i64> {
        let result = self
            .execute(
                "INSERT INTO t_sa_sql_advice_info (db_id, sql_text, advice, message) VALUES (?, ?, ?, ?)",
                &[db_id.into(), sql_text.into(), advice.into(), message.into()],
            )
            .await?;

        let id = result.last_insert_rowid();
        tracing::debug!("Saved advice record {} for database {}", id, db_id);
        Ok(id)
    }

    /// Most recent audit rows of a database, newest first
    pub async fn list_by_db_id(&self, db_id: i64, limit: i64) -> AdvisorResult<Vec<AdviceRecord>> {
        let records = sqlx::query_as::<_, AdviceRecord>(
            r#"
            SELECT id, db_id, sql_text, advice, message, create_time
            FROM t_sa_sql_advice_info
            WHERE db_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(db_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
