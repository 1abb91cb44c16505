use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{RecordId, Role, SubjectId, Viewer};
use super::repository::{
    GuidelineProvider, ProfileProvider, RepositoryError, TestRecordProvider,
};
use super::service::{ServiceError, TestResultService};
use super::validation::RecordDraft;

pub const SUBJECT_HEADER: &str = "x-subject-id";
pub const ROLE_HEADER: &str = "x-role";

type SharedService<P, R, G> = Arc<TestResultService<P, R, G>>;

/// Router builder exposing record entry, evaluation, history, and roster endpoints.
pub fn record_router<P, R, G>(service: SharedService<P, R, G>) -> Router
where
    P: ProfileProvider + 'static,
    R: TestRecordProvider + 'static,
    G: GuidelineProvider + 'static,
{
    Router::new()
        .route("/api/v1/records", post(submit_handler::<P, R, G>))
        .route(
            "/api/v1/records/:record_id/report",
            get(report_handler::<P, R, G>),
        )
        .route(
            "/api/v1/records/:record_id/history",
            get(history_handler::<P, R, G>),
        )
        .route(
            "/api/v1/subjects/:subject_id/records",
            get(list_handler::<P, R, G>),
        )
        .route("/api/v1/subjects", get(roster_handler::<P, R, G>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RosterParams {
    #[serde(default)]
    pub(crate) search: Option<String>,
}

/// Caller identity comes from headers set by the upstream auth layer.
pub(crate) fn viewer_from_headers(headers: &HeaderMap) -> Result<Viewer, Response> {
    let subject_id = headers
        .get(SUBJECT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "missing x-subject-id header"))?;

    let role = match headers.get(ROLE_HEADER).and_then(|value| value.to_str().ok()) {
        None => Role::User,
        Some(raw) => Role::parse(raw)
            .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "unrecognised x-role header"))?,
    };

    Ok(Viewer {
        subject_id: SubjectId(subject_id.to_string()),
        role,
    })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, axum::Json(payload)).into_response()
}

fn service_error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Forbidden(_) | ServiceError::Repository(RepositoryError::Unauthorized) => {
            StatusCode::FORBIDDEN
        }
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, error.to_string())
}

pub(crate) async fn submit_handler<P, R, G>(
    State(service): State<SharedService<P, R, G>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<RecordDraft>,
) -> Response
where
    P: ProfileProvider + 'static,
    R: TestRecordProvider + 'static,
    G: GuidelineProvider + 'static,
{
    let viewer = match viewer_from_headers(&headers) {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    match service.submit(&viewer, draft) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn report_handler<P, R, G>(
    State(service): State<SharedService<P, R, G>>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
) -> Response
where
    P: ProfileProvider + 'static,
    R: TestRecordProvider + 'static,
    G: GuidelineProvider + 'static,
{
    let viewer = match viewer_from_headers(&headers) {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    match service.guideline_report(&viewer, &RecordId(record_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn history_handler<P, R, G>(
    State(service): State<SharedService<P, R, G>>,
    headers: HeaderMap,
    Path(record_id): Path<String>,
) -> Response
where
    P: ProfileProvider + 'static,
    R: TestRecordProvider + 'static,
    G: GuidelineProvider + 'static,
{
    let viewer = match viewer_from_headers(&headers) {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    match service.history(&viewer, &RecordId(record_id)) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn list_handler<P, R, G>(
    State(service): State<SharedService<P, R, G>>,
    headers: HeaderMap,
    Path(subject_id): Path<String>,
) -> Response
where
    P: ProfileProvider + 'static,
    R: TestRecordProvider + 'static,
    G: GuidelineProvider + 'static,
{
    let viewer = match viewer_from_headers(&headers) {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    match service.list_records(&viewer, &SubjectId(subject_id)) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn roster_handler<P, R, G>(
    State(service): State<SharedService<P, R, G>>,
    headers: HeaderMap,
    Query(params): Query<RosterParams>,
) -> Response
where
    P: ProfileProvider + 'static,
    R: TestRecordProvider + 'static,
    G: GuidelineProvider + 'static,
{
    let viewer = match viewer_from_headers(&headers) {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    match service.roster(&viewer, params.search.as_deref()) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => service_error_response(error),
    }
}
