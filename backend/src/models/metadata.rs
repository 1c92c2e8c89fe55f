use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Row of `t_meta_db_info`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DbInfo {
    pub id: i64,
    pub db_name: String,
    pub cluster_id: i64,
    pub cluster_type: i64,
    pub env_id: i64,
    pub del_flag: i64,
    #[schema(value_type = String)]
    pub create_time: NaiveDateTime,
    #[schema(value_type = String)]
    pub last_update_time: NaiveDateTime,
}

/// Row of `t_meta_mysql_server_info`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MySQLServerInfo {
    pub id: i64,
    pub cluster_id: i64,
    pub server_name: String,
    pub service_name: String,
    pub host_ip: String,
    pub port_num: i64,
    pub deployment_type: i64,
    pub del_flag: i64,
    #[schema(value_type = String)]
    pub create_time: NaiveDateTime,
    #[schema(value_type = String)]
    pub last_update_time: NaiveDateTime,
}
