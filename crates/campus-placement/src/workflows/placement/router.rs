use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::{JobId, StudentId};
use super::repository::{NotificationPublisher, PlacementRepository, RepositoryError};
use super::service::{JobFilter, PlacementService, PlacementServiceError, StudentFilter};
use crate::matching::CompanyTier;

/// Router exposing application intake and eligibility endpoints.
pub fn placement_router<R, N>(service: Arc<PlacementService<R, N>>) -> Router
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<R, N>))
        .route(
            "/api/v1/jobs/:job_id/eligibility/:student_id",
            get(check_handler::<R, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/eligible-students",
            get(eligible_students_handler::<R, N>),
        )
        .route(
            "/api/v1/students/:student_id/eligible-jobs",
            get(eligible_jobs_handler::<R, N>),
        )
        .route(
            "/api/v1/students/:student_id/recommendations",
            get(recommendations_handler::<R, N>),
        )
        .route("/api/v1/eligibility/bulk", post(bulk_handler::<R, N>))
        .route("/api/v1/eligibility/evaluate", post(evaluate_handler::<R, N>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationRequest {
    pub(crate) student_id: StudentId,
    pub(crate) job_id: JobId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkRequest {
    pub(crate) job_id: JobId,
    pub(crate) student_ids: Vec<StudentId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    pub(crate) job: Value,
    pub(crate) student: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EligibleJobsQuery {
    #[serde(default)]
    pub(crate) include_ineligible: bool,
    pub(crate) category: Option<String>,
    pub(crate) tier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EligibleStudentsQuery {
    #[serde(default)]
    pub(crate) include_ineligible: bool,
    pub(crate) department: Option<String>,
    pub(crate) format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecommendationsQuery {
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<PlacementService<R, N>>>,
    payload: Result<axum::Json<ApplicationRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let axum::Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.submit_application(&request.student_id, &request.job_id, Utc::now()) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn check_handler<R, N>(
    State(service): State<Arc<PlacementService<R, N>>>,
    Path((job_id, student_id)): Path<(String, String)>,
) -> Response
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.check_eligibility(&StudentId(student_id), &JobId(job_id), Utc::now()) {
        Ok(check) => (StatusCode::OK, axum::Json(check)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn eligible_jobs_handler<R, N>(
    State(service): State<Arc<PlacementService<R, N>>>,
    Path(student_id): Path<String>,
    Query(query): Query<EligibleJobsQuery>,
) -> Response
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let filter = JobFilter {
        category: query.category.filter(|value| !value.trim().is_empty()),
        tier: query
            .tier
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(CompanyTier::parse),
        include_ineligible: query.include_ineligible,
    };

    match service.eligible_jobs(&StudentId(student_id), &filter, Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn eligible_students_handler<R, N>(
    State(service): State<Arc<PlacementService<R, N>>>,
    Path(job_id): Path<String>,
    Query(query): Query<EligibleStudentsQuery>,
) -> Response
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let filter = StudentFilter {
        department: query.department,
        include_ineligible: query.include_ineligible,
    };

    let report = match service.eligible_students(&JobId(job_id.clone()), &filter) {
        Ok(report) => report,
        Err(error) => return service_error_response(error),
    };

    if !query
        .format
        .as_deref()
        .is_some_and(|format| format.eq_ignore_ascii_case("csv"))
    {
        return (StatusCode::OK, axum::Json(report)).into_response();
    }

    let mut buffer = Vec::new();
    if let Err(error) = report.write_csv(&mut buffer) {
        let payload = json!({ "error": error.to_string() });
        return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
    }

    let disposition = format!("attachment; filename=\"eligible-students-{job_id}.csv\"");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
        .into_response()
}

pub(crate) async fn recommendations_handler<R, N>(
    State(service): State<Arc<PlacementService<R, N>>>,
    Path(student_id): Path<String>,
    Query(query): Query<RecommendationsQuery>,
) -> Response
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.recommendations(&StudentId(student_id), query.limit, Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn bulk_handler<R, N>(
    State(service): State<Arc<PlacementService<R, N>>>,
    payload: Result<axum::Json<BulkRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let axum::Json(request) = match payload {
        Ok(payload) => payload,
        Err(_) => return bad_request("jobId and a studentIds array are required".to_string()),
    };

    match service.bulk_check(&request.job_id, &request.student_ids) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn evaluate_handler<R, N>(
    State(service): State<Arc<PlacementService<R, N>>>,
    payload: Result<axum::Json<EvaluateRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let axum::Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.evaluate_documents(&request.job, &request.student) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => bad_request(error.to_string()),
    }
}

impl IntoResponse for PlacementServiceError {
    fn into_response(self) -> Response {
        service_error_response(self)
    }
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

pub(crate) fn service_error_response(error: PlacementServiceError) -> Response {
    let status = match &error {
        PlacementServiceError::JobNotFound(_) | PlacementServiceError::StudentNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        PlacementServiceError::ProfileIncomplete | PlacementServiceError::JobClosed(_) => {
            StatusCode::BAD_REQUEST
        }
        PlacementServiceError::PlacementLocked { .. } | PlacementServiceError::NotVerified => {
            StatusCode::FORBIDDEN
        }
        PlacementServiceError::Ineligible { issues } => {
            let payload = json!({
                "error": error.to_string(),
                "reasons": issues,
            });
            return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
        }
        PlacementServiceError::AlreadyApplied
        | PlacementServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        PlacementServiceError::Eligibility(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PlacementServiceError::Repository(_) | PlacementServiceError::Notification(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
