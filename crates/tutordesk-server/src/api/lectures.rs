use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tutordesk_compliance::LectureInput;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_compliance_error, map_db_error, map_lookup_error, parse_uuid, ApiError, ApiResponse,
    AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LectureItem {
    id: Uuid,
    volunteer_id: Uuid,
    name: String,
    subject: String,
    student_email: String,
    link: String,
    lecture_date: Option<DateTime<Utc>>,
    duration: Decimal,
    created_at: DateTime<Utc>,
}

impl From<tutordesk_db::LectureRow> for LectureItem {
    fn from(row: tutordesk_db::LectureRow) -> Self {
        Self {
            id: row.id,
            volunteer_id: row.volunteer_id,
            name: row.name,
            subject: row.subject,
            student_email: row.student_email,
            link: row.link,
            lecture_date: row.lecture_date,
            duration: row.duration,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_lectures(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<LectureItem>>>, ApiError> {
    let volunteer_id = parse_uuid(&req_id.0, &id, "volunteer id")?;

    tutordesk_db::get_volunteer(&state.pool, volunteer_id)
        .await
        .map_err(|e| map_lookup_error(req_id.0.clone(), &e, "volunteer"))?;

    let rows = tutordesk_db::list_lectures(&state.pool, volunteer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(LectureItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn add_lecture(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<LectureInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<LectureItem>>), ApiError> {
    let volunteer_id = parse_uuid(&req_id.0, &id, "volunteer id")?;
    let Json(input) = body.map_err(|rejection| {
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;

    let lecture = tutordesk_compliance::add_lecture(&state.pool, volunteer_id, &input)
        .await
        .map_err(|e| map_compliance_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: lecture.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn delete_lecture(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(lecture_id): Path<String>,
) -> Result<Json<ApiResponse<LectureItem>>, ApiError> {
    let lecture_id = parse_uuid(&req_id.0, &lecture_id, "lecture id")?;

    let lecture = tutordesk_compliance::delete_lecture(&state.pool, lecture_id)
        .await
        .map_err(|e| map_compliance_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: lecture.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
