// Common test utilities and helpers

use crate::config::AdvisorConfig;
use crate::services::sql_advisor::{
    AdviceRepository, AdvisorError, AdvisorResult, Invoker, SqlAdvisorService,
    SqliteMetadataSource,
};
use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// soar report for `select * from t_meta_db_info where create_time<'2021-01-01'`
pub const SOAR_SAMPLE_OUTPUT: &str = r#"2022/01/01 10:00:00.000 [I] [main.go:120] soar start
2022/01/01 10:00:00.012 [D] [vitess.go:48] online dsn accepted
# Query: 7A2D1E8B3C5F6A90

★ ★ ★ ☆ ☆ 75分

```sql

SELECT
  *
FROM
  t_meta_db_info
WHERE
  create_time<'2021-01-01'
```

##  Avoid SELECT * queries

* **Item:**  COL.001

* **Severity:**  L1

* **Content:**  Selecting every column with * changes the meaning of the query when the table structure changes.
"#;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Insert a database row and return its id
pub async fn create_database(pool: &SqlitePool, db_name: &str, cluster_id: i64) -> i64 {
    sqlx::query("INSERT INTO t_meta_db_info (db_name, cluster_id) VALUES (?, ?)")
        .bind(db_name)
        .bind(cluster_id)
        .execute(pool)
        .await
        .expect("Failed to insert test database")
        .last_insert_rowid()
}

/// Insert a MySQL server row for a cluster
pub async fn create_server(pool: &SqlitePool, cluster_id: i64, host_ip: &str, port_num: i64) {
    sqlx::query(
        "INSERT INTO t_meta_mysql_server_info (cluster_id, server_name, host_ip, port_num) VALUES (?, ?, ?, ?)",
    )
    .bind(cluster_id)
    .bind(format!("{}_{}", host_ip, port_num))
    .bind(host_ip)
    .bind(port_num)
    .execute(pool)
    .await
    .expect("Failed to insert test server");
}

/// Seed ids 1 and 2: database 2 lives on cluster 1 which has one server,
/// database 1 lives on cluster 9 which has none
pub async fn setup_test_data(pool: &SqlitePool) {
    create_database(pool, "orphan", 9).await;
    create_database(pool, "das", 1).await;
    create_server(pool, 1, "192.168.10.219", 3306).await;
}

pub async fn count_advice_rows(pool: &SqlitePool, db_id: i64) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM t_sa_sql_advice_info WHERE db_id = ?")
        .bind(db_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count advice rows");
    count
}

pub fn test_advisor_config() -> AdvisorConfig {
    AdvisorConfig {
        soar_bin: "/usr/local/bin/soar".to_string(),
        soar_config: "/etc/soar.yaml".to_string(),
        db_user: "root".to_string(),
        db_pass: "root".to_string(),
        timeout_secs: 5,
    }
}

/// What a stub invoker returns
pub enum StubReply {
    Output(String),
    SpawnFailure,
    Hang,
}

/// Invoker that records its arguments instead of spawning soar
pub struct StubInvoker {
    reply: StubReply,
    pub calls: Mutex<Vec<(String, String, String, String)>>,
}

impl StubInvoker {
    pub fn new(reply: StubReply) -> Arc<Self> {
        Arc::new(Self { reply, calls: Mutex::new(Vec::new()) })
    }

    pub fn with_output(output: &str) -> Arc<Self> {
        Self::new(StubReply::Output(output.to_string()))
    }
}

#[async_trait]
impl Invoker for StubInvoker {
    async fn run(
        &self,
        soar_bin: &str,
        config_file: &str,
        dsn: &str,
        sql_text: &str,
    ) -> AdvisorResult<String> {
        self.calls.lock().unwrap().push((
            soar_bin.to_string(),
            config_file.to_string(),
            dsn.to_string(),
            sql_text.to_string(),
        ));

        match &self.reply {
            StubReply::Output(out) => Ok(out.clone()),
            StubReply::SpawnFailure => Err(AdvisorError::Spawn {
                binary: soar_bin.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
            StubReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            },
        }
    }
}

/// Service over the test pool with a stubbed soar
pub fn create_test_service(
    pool: &SqlitePool,
    invoker: Arc<StubInvoker>,
    config: AdvisorConfig,
) -> SqlAdvisorService {
    SqlAdvisorService::with_parts(
        Arc::new(SqliteMetadataSource::new(pool.clone())),
        invoker,
        AdviceRepository::new(pool.clone()),
        config,
    )
}
