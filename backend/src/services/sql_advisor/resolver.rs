//! Resolves the online DSN of a database from inventory metadata

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::error::{AdvisorError, AdvisorResult};
use crate::models::{DbInfo, MySQLServerInfo};

/// Metadata the resolver depends on
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// `Ok(None)` when no live database has this id
    async fn get_database_by_id(&self, db_id: i64) -> AdvisorResult<Option<DbInfo>>;

    /// Servers of a cluster in the order the resolver should consider them
    async fn get_servers_by_cluster_id(&self, cluster_id: i64)
    -> AdvisorResult<Vec<MySQLServerInfo>>;
}

/// Metadata backed by the `t_meta_*` tables
#[derive(Clone)]
pub struct SqliteMetadataSource {
    pool: SqlitePool,
}

impl SqliteMetadataSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataSource for SqliteMetadataSource {
    async fn get_database_by_id(&self, db_id: i64) -> AdvisorResult<Option<DbInfo>> {
        sqlx::query_as::<_, DbInfo>(
            r#"
            SELECT id, db_name, cluster_id, cluster_type, env_id, del_flag,
                   create_time, last_update_time
            FROM t_meta_db_info
            WHERE del_flag = 0 AND id = ?
            "#,
        )
        .bind(db_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AdvisorError::metadata_lookup(format!("database {}", db_id), e))
    }

    async fn get_servers_by_cluster_id(
        &self,
        cluster_id: i64,
    ) -> AdvisorResult<Vec<MySQLServerInfo>> {
        sqlx::query_as::<_, MySQLServerInfo>(
            r#"
            SELECT id, cluster_id, server_name, service_name, host_ip, port_num,
                   deployment_type, del_flag, create_time, last_update_time
            FROM t_meta_mysql_server_info
            WHERE del_flag = 0 AND cluster_id = ?
            ORDER BY id
            "#,
        )
        .bind(cluster_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AdvisorError::metadata_lookup(format!("servers of cluster {}", cluster_id), e))
    }
}

/// Host, port and schema soar connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub cluster_id: i64,
    pub db_name: String,
    pub host_ip: String,
    pub port_num: i64,
}

impl ConnectionTarget {
    /// `user:pass@host:port/db`
    ///
    /// Carries credentials, never log the result.
    pub fn dsn(&self, user: &str, pass: &str) -> String {
        format!("{}:{}@{}:{}/{}", user, pass, self.host_ip, self.port_num, self.db_name)
    }
}

#[derive(Clone)]
pub struct TargetResolver {
    metadata: Arc<dyn MetadataSource>,
}

impl TargetResolver {
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self { metadata }
    }

    /// Join database -> cluster -> servers and pick the analysis target
    ///
    /// The first server returned by the metadata source is used; no
    /// master/replica preference is applied.
    pub async fn resolve(&self, db_id: i64) -> AdvisorResult<ConnectionTarget> {
        let db = self
            .metadata
            .get_database_by_id(db_id)
            .await?
            .ok_or(AdvisorError::DatabaseNotFound { db_id })?;

        let servers = self.metadata.get_servers_by_cluster_id(db.cluster_id).await?;
        let server = servers.into_iter().next().ok_or(AdvisorError::NoServerAvailable {
            db_id,
            cluster_id: db.cluster_id,
        })?;

        tracing::debug!(
            "Resolved database {} to cluster {} server {}:{}",
            db_id,
            db.cluster_id,
            server.host_ip,
            server.port_num
        );

        Ok(ConnectionTarget {
            cluster_id: db.cluster_id,
            db_name: db.db_name,
            host_ip: server.host_ip,
            port_num: server.port_num,
        })
    }

    pub async fn get_online_dsn(&self, db_id: i64, user: &str, pass: &str) -> AdvisorResult<String> {
        let target = self.resolve(db_id).await?;
        Ok(target.dsn(user, pass))
    }
}
