use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// One row of the append-only advice audit table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AdviceRecord {
    pub id: i64,
    pub db_id: i64,
    pub sql_text: String,
    pub advice: String,
    pub message: String,
    #[schema(value_type = String)]
    pub create_time: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SqlTextRequest {
    #[validate(length(min = 1, message = "sql_text cannot be empty"))]
    pub sql_text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FingerprintResponse {
    pub sql_text: String,
    pub fingerprint: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SqlIdResponse {
    pub sql_text: String,
    pub sql_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdviseRequest {
    #[validate(range(min = 1, message = "db_id must be positive"))]
    pub db_id: i64,
    #[validate(length(min = 1, message = "sql_text cannot be empty"))]
    pub sql_text: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct AdviceRecordQuery {
    #[validate(range(min = 1, message = "db_id must be positive"))]
    pub db_id: i64,
    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: Option<i64>,
}
