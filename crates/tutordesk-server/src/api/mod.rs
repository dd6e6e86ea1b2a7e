mod compliance;
mod compliance_runs;
mod lectures;
mod notifications;
mod volunteers;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tutordesk_compliance::ComplianceError;
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Calendar the compliance week is computed in.
    pub calendar: FixedOffset,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &tutordesk_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Like [`map_db_error`] but a missing row becomes a 404 carrying `what`.
pub(super) fn map_lookup_error(
    request_id: String,
    error: &tutordesk_db::DbError,
    what: &str,
) -> ApiError {
    match error {
        tutordesk_db::DbError::NotFound => {
            ApiError::new(request_id, "not_found", format!("{what} not found"))
        }
        other => map_db_error(request_id, other),
    }
}

pub(super) fn map_compliance_error(request_id: String, error: &ComplianceError) -> ApiError {
    match error {
        ComplianceError::Validation(msg) => ApiError::new(request_id, "validation_error", msg),
        ComplianceError::NotFound(msg) => ApiError::new(request_id, "not_found", msg),
        ComplianceError::Db(e) => map_db_error(request_id, e),
    }
}

pub(super) fn parse_uuid(request_id: &str, raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("{what} must be a UUID, got '{raw}'"),
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/compliance/low-lecture-members",
            get(compliance::get_low_lecture_members),
        )
        .route(
            "/api/v1/compliance/low-lecture-members/{id}",
            delete(compliance::remove_low_lecture_member),
        )
        .route(
            "/api/v1/compliance/runs",
            get(compliance_runs::list_compliance_runs),
        )
        .route("/api/v1/volunteers", get(volunteers::list_volunteers))
        .route("/api/v1/volunteers/{id}", get(volunteers::get_volunteer))
        .route(
            "/api/v1/volunteers/{id}/lectures",
            get(lectures::list_lectures).post(lectures::add_lecture),
        )
        .route(
            "/api/v1/lectures/{lecture_id}",
            delete(lectures::delete_lecture),
        )
        .route(
            "/api/v1/volunteers/{id}/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/v1/volunteers/{id}/notifications/mark-read",
            post(notifications::mark_notifications_read),
        )
        .route(
            "/api/v1/volunteers/{id}/notifications/{notification_id}",
            delete(notifications::delete_notification),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match tutordesk_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

/// Limiter allowing `max_requests` per minute across protected routes.
pub fn per_minute_rate_limit(max_requests: usize) -> RateLimitState {
    RateLimitState::new(max_requests, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
