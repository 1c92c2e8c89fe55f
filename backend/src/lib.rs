//! Database autonomy admin service
//!
//! Hosts the SQL tuning advisor: fingerprinting, SQL IDs and soar-backed
//! advice for inventory databases, with an audit trail of every analysis.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Config;
pub use services::SqlAdvisorService;

/// Shared application state handed to every handler
pub struct AppState {
    pub db: SqlitePool,
    pub sql_advisor_service: SqlAdvisorService,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        let sql_advisor_service = SqlAdvisorService::new(db.clone(), config.advisor.clone());
        Self { db, sql_advisor_service }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::sql_advisor::get_fingerprint,
        handlers::sql_advisor::get_sql_id,
        handlers::sql_advisor::advise,
        handlers::sql_advisor::list_records,
    ),
    components(schemas(
        handlers::health::HealthResponse,
        models::SqlTextRequest,
        models::AdviseRequest,
        models::FingerprintResponse,
        models::SqlIdResponse,
        models::AdviceRecord,
    )),
    tags(
        (name = "SQL Advisor", description = "SQL fingerprinting and tuning advice"),
        (name = "Health", description = "Service liveness"),
    )
)]
pub struct ApiDoc;

/// Build the HTTP router
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/sqladvisor/fingerprint", post(handlers::sql_advisor::get_fingerprint))
        .route("/sqladvisor/sql-id", post(handlers::sql_advisor::get_sql_id))
        .route("/sqladvisor/advise", post(handlers::sql_advisor::advise))
        .route("/sqladvisor/records", get(handlers::sql_advisor::list_records));

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
