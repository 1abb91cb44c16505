use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use tower::ServiceExt;

use super::common::*;
use crate::records::router::{
    record_router, report_handler, viewer_from_headers, ROLE_HEADER, SUBJECT_HEADER,
};
use crate::records::{ParameterCatalog, Role, TestResultService};

fn get(uri: &str, subject: &str, role: &str) -> Request<Body> {
    Request::get(uri)
        .header(SUBJECT_HEADER, subject)
        .header(ROLE_HEADER, role)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn submit_route_creates_record() {
    let (service, _) = build_service();
    let router = record_router(service);

    let payload = serde_json::to_vec(&draft(PATIENT, (2024, 1, 1), &[("IgA", "3.5")])).unwrap();
    let response = router
        .oneshot(
            Request::post("/api/v1/records")
                .header(header::CONTENT_TYPE, "application/json")
                .header(SUBJECT_HEADER, PATIENT)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["subject_id"], PATIENT);
    assert_eq!(body["results"]["IgA"]["value"], 3.5);
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn submit_route_returns_unprocessable_for_invalid_values() {
    let (service, _) = build_service();
    let router = record_router(service);

    let payload = serde_json::to_vec(&draft(PATIENT, (2024, 1, 1), &[("IgA", "-1")])).unwrap();
    let response = router
        .oneshot(
            Request::post("/api/v1/records")
                .header(header::CONTENT_TYPE, "application/json")
                .header(SUBJECT_HEADER, PATIENT)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn report_route_returns_guideline_outcomes() {
    let (service, _) = build_service();
    let record = submit(&service, PATIENT, (2024, 1, 1), &[("IgA", "3.5")]);
    let router = record_router(service);

    let uri = format!("/api/v1/records/{}/report", record_id(&record));
    let response = router.oneshot(get(&uri, PATIENT, "user")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["age_months"], 103);
    let standard = &body["guidelines"][0];
    assert_eq!(standard["guideline"], "Standard");
    assert_eq!(standard["parameters"][0]["outcome"]["status"], "evaluated");
    assert_eq!(standard["parameters"][0]["outcome"]["verdict"], "above");
}

#[tokio::test]
async fn report_route_maps_missing_and_foreign_records() {
    let (service, _) = build_service();
    let record = submit(&service, PATIENT, (2024, 1, 1), &[("IgA", "1.0")]);
    let router = record_router(service);

    let missing = router
        .clone()
        .oneshot(get("/api/v1/records/rec-424242/report", ADMIN, "admin"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/records/{}/history", record_id(&record));
    let foreign = router.oneshot(get(&uri, SIBLING, "user")).await.unwrap();
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn roster_route_filters_by_search_term() {
    let (service, _) = build_service();
    let router = record_router(service);

    let response = router
        .clone()
        .oneshot(get("/api/v1/subjects?search=ayse", ADMIN, "admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["name"], "Ayse Demir");

    let forbidden = router
        .oneshot(get("/api/v1/subjects", PATIENT, "user"))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_route_returns_summaries() {
    let (service, _) = build_service();
    submit(&service, PATIENT, (2024, 1, 1), &[("IgA", "1.0")]);
    let router = record_router(service);

    let uri = format!("/api/v1/subjects/{PATIENT}/records");
    let response = router.oneshot(get(&uri, PATIENT, "user")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["preview"], "IgA: 1 mg/dL");
}

#[tokio::test]
async fn report_handler_returns_internal_error_when_store_is_down() {
    let store = Arc::new(UnavailableStore);
    let service = Arc::new(TestResultService::new(
        store.clone(),
        store.clone(),
        store,
        ParameterCatalog::immunoglobulin_panel(),
    ));

    let mut headers = axum::http::HeaderMap::new();
    headers.insert(SUBJECT_HEADER, ADMIN.parse().unwrap());
    headers.insert(ROLE_HEADER, "admin".parse().unwrap());

    let response = report_handler::<UnavailableStore, UnavailableStore, UnavailableStore>(
        State(service),
        headers,
        axum::extract::Path("rec-000001".to_string()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn viewer_headers_require_subject_and_known_role() {
    let mut headers = axum::http::HeaderMap::new();
    let missing = viewer_from_headers(&headers).expect_err("subject header required");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    headers.insert(SUBJECT_HEADER, PATIENT.parse().unwrap());
    let viewer = viewer_from_headers(&headers).expect("defaults to user");
    assert_eq!(viewer.role, Role::User);

    headers.insert(ROLE_HEADER, "superuser".parse().unwrap());
    let bad_role = viewer_from_headers(&headers).expect_err("unknown role");
    assert_eq!(bad_role.status(), StatusCode::BAD_REQUEST);
}
