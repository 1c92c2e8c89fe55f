use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use std::sync::Arc;
use tower::ServiceExt;

use crate::tests::common::{
    SOAR_SAMPLE_OUTPUT, StubInvoker, create_test_db, create_test_service, setup_test_data,
    test_advisor_config,
};
use crate::{AppState, build_router};

async fn test_app(output: &str) -> axum::Router {
    let pool = create_test_db().await;
    setup_test_data(&pool).await;
    let service =
        create_test_service(&pool, StubInvoker::with_output(output), test_advisor_config());
    build_router(Arc::new(AppState { db: pool, sql_advisor_service: service }))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_fingerprint_endpoint() {
    let app = test_app("").await;

    let response = app
        .oneshot(post_json(
            "/api/sqladvisor/fingerprint",
            serde_json::json!({"sql_text": "select a from t where id = 10"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["sql_text"], "select a from t where id = 10");
    assert_eq!(body["fingerprint"], "select a from t where id = ?");
}

#[tokio::test]
async fn test_sql_id_endpoint() {
    let app = test_app("").await;

    let response = app
        .oneshot(post_json("/api/sqladvisor/sql-id", serde_json::json!({"sql_text": "select 1"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["sql_id"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn test_empty_sql_text_is_rejected() {
    let app = test_app("").await;

    let response = app
        .oneshot(post_json("/api/sqladvisor/fingerprint", serde_json::json!({"sql_text": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_advise_endpoint_returns_raw_advice() {
    let app = test_app(SOAR_SAMPLE_OUTPUT).await;

    let response = app
        .oneshot(post_json(
            "/api/sqladvisor/advise",
            serde_json::json!({
                "db_id": 2,
                "sql_text": "select * from t_meta_db_info where create_time<'2021-01-01';"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("COL.001"));
}

#[tokio::test]
async fn test_advise_endpoint_reports_resolution_failure() {
    let app = test_app(SOAR_SAMPLE_OUTPUT).await;

    let response = app
        .oneshot(post_json(
            "/api/sqladvisor/advise",
            serde_json::json!({"db_id": 1, "sql_text": "select 1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["code"], 6003);
    assert_eq!(body["details"]["advice"], "");
}

#[tokio::test]
async fn test_records_endpoint() {
    let app = test_app(SOAR_SAMPLE_OUTPUT).await;

    let advise = post_json(
        "/api/sqladvisor/advise",
        serde_json::json!({"db_id": 2, "sql_text": "select * from t"}),
    );
    let response = app.clone().oneshot(advise).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sqladvisor/records?db_id=2&limit=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["db_id"], 2);
    assert_eq!(records[0]["sql_text"], "select * from t");
}

#[tokio::test]
async fn test_health() {
    let app = test_app("").await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_health_reports_unreachable_store() {
    let pool = create_test_db().await;
    let service =
        create_test_service(&pool, StubInvoker::with_output(""), test_advisor_config());
    let app = build_router(Arc::new(AppState { db: pool.clone(), sql_advisor_service: service }));
    pool.close().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "degraded");
}
