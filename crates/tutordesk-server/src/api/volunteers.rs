use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_lookup_error, parse_uuid, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct VolunteerItem {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    membership_status: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    volunteer_hours: Option<Decimal>,
    lecture_count: i32,
    low_lecture_streak: i32,
    last_flagged_week: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<tutordesk_db::VolunteerRow> for VolunteerItem {
    fn from(row: tutordesk_db::VolunteerRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role,
            membership_status: row.membership_status,
            volunteer_hours: row.volunteer_hours,
            lecture_count: row.lecture_count,
            low_lecture_streak: row.low_lecture_streak,
            last_flagged_week: row.last_flagged_week,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_volunteers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<VolunteerItem>>>, ApiError> {
    let rows = tutordesk_db::list_volunteers(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(VolunteerItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_volunteer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VolunteerItem>>, ApiError> {
    let id = parse_uuid(&req_id.0, &id, "volunteer id")?;
    let row = tutordesk_db::get_volunteer(&state.pool, id)
        .await
        .map_err(|e| map_lookup_error(req_id.0.clone(), &e, "volunteer"))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
