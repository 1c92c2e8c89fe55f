//! SQL advisor handlers

use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use crate::models::{
    AdviceRecord, AdviceRecordQuery, AdviseRequest, FingerprintResponse, SqlIdResponse,
    SqlTextRequest,
};
use crate::utils::{ApiError, ApiResult};

const DEFAULT_RECORD_LIMIT: i64 = 20;

/// POST /api/sqladvisor/fingerprint
#[utoipa::path(
    post,
    path = "/api/sqladvisor/fingerprint",
    request_body = SqlTextRequest,
    responses(
        (status = 200, description = "Normalized SQL fingerprint", body = FingerprintResponse),
        (status = 400, description = "Invalid SQL text")
    ),
    tag = "SQL Advisor"
)]
pub async fn get_fingerprint(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SqlTextRequest>,
) -> ApiResult<Json<FingerprintResponse>> {
    req.validate()?;

    let fingerprint = state.sql_advisor_service.get_fingerprint(&req.sql_text)?;

    Ok(Json(FingerprintResponse { sql_text: req.sql_text, fingerprint }))
}

/// POST /api/sqladvisor/sql-id
#[utoipa::path(
    post,
    path = "/api/sqladvisor/sql-id",
    request_body = SqlTextRequest,
    responses(
        (status = 200, description = "SQL ID derived from the fingerprint", body = SqlIdResponse),
        (status = 400, description = "Invalid SQL text")
    ),
    tag = "SQL Advisor"
)]
pub async fn get_sql_id(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SqlTextRequest>,
) -> ApiResult<Json<SqlIdResponse>> {
    req.validate()?;

    let sql_id = state.sql_advisor_service.get_sql_id(&req.sql_text)?;

    Ok(Json(SqlIdResponse { sql_text: req.sql_text, sql_id }))
}

/// POST /api/sqladvisor/advise
///
/// Responds with the raw advice text. When the analysis collected errors the
/// response is an error whose `details.advice` holds any partial advice.
#[utoipa::path(
    post,
    path = "/api/sqladvisor/advise",
    request_body = AdviseRequest,
    responses(
        (status = 200, description = "Advice text", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid request or unresolvable database"),
        (status = 500, description = "Advisor failed, partial advice in details")
    ),
    tag = "SQL Advisor"
)]
pub async fn advise(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdviseRequest>,
) -> ApiResult<String> {
    req.validate()?;
    tracing::info!("Advise request for database {}", req.db_id);

    let outcome = state.sql_advisor_service.advise(req.db_id, &req.sql_text).await?;

    match outcome.into_result() {
        Ok(advice) => Ok(advice),
        Err((advice, errors)) => {
            tracing::warn!("Advise for database {} finished with errors: {}", req.db_id, errors);
            Err(ApiError::advice_failed(advice, errors))
        },
    }
}

/// GET /api/sqladvisor/records
#[utoipa::path(
    get,
    path = "/api/sqladvisor/records",
    params(AdviceRecordQuery),
    responses(
        (status = 200, description = "Latest advice records of a database", body = Vec<AdviceRecord>)
    ),
    tag = "SQL Advisor"
)]
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdviceRecordQuery>,
) -> ApiResult<Json<Vec<AdviceRecord>>> {
    query.validate()?;

    let limit = query.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    let records = state.sql_advisor_service.list_records(query.db_id, limit).await?;

    tracing::debug!("Retrieved {} advice records for database {}", records.len(), query.db_id);
    Ok(Json(records))
}
